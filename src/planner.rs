//! Runs the user-facing flows against the store and the estimator.
//!
//! [`Planner`] owns the [`TaskStore`] and an [`Estimator`]. Adding a task is
//! the only flow with await points: the task is persisted first, then the
//! estimate is requested and attached, then (for dated tasks) the day is
//! checked for overload. Estimation trouble never undoes the add; it only
//! turns into a [`Notice`].

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::ClarityError;
use crate::estimate::{EstimateRequest, Estimator, OverloadRequest, OverloadResponse};
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft, TaskPatch, lifecycle, schedule};

/// Severity of a [`Notice`], which decides how it is styled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    /// Something the user may want to act on, like a full day.
    Warning,
    /// Part of an operation failed; the rest went through.
    Error,
}

/// A transient, non-blocking message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub title: String,
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, title: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Everything that came out of one add.
#[derive(Debug, Clone)]
pub struct AddReport {
    /// The task as stored once the add settled, estimate included if any.
    pub task: Task,
    /// `None` when the task has no due date or the check failed.
    pub overload: Option<OverloadResponse>,
    /// In display order: the add itself, any alert, then any failure.
    pub notices: Vec<Notice>,
}

/// Holds the in-flight flag for as long as a submission runs.
struct SubmitGuard<'a>(&'a AtomicBool);

impl<'a> SubmitGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ClarityError> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| ClarityError::SubmissionInFlight)?;
        Ok(Self(flag))
    }
}

impl Drop for SubmitGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Owns the task store and the estimator and runs the user-facing flows.
///
/// The store sits behind a mutex that is never held across an await, so
/// toggles, edits and deletes stay available while an add is estimating.
pub struct Planner<E> {
    store: Mutex<TaskStore>,
    estimator: E,
    submitting: AtomicBool,
}

impl<E: Estimator> Planner<E> {
    pub fn new(store: TaskStore, estimator: E) -> Self {
        Self {
            store: Mutex::new(store),
            estimator,
            submitting: AtomicBool::new(false),
        }
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }

    /// True while an add is awaiting the estimator.
    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    /// Snapshot of the list in display order.
    pub fn sorted_tasks(&self) -> Vec<Task> {
        self.store().sorted().into_iter().cloned().collect()
    }

    /// Maps a full id or unique prefix to the task's id.
    pub fn resolve_id(&self, id_or_prefix: &str) -> Result<String, ClarityError> {
        self.store().resolve(id_or_prefix).map(|task| task.id.clone())
    }

    /// Validates and stores a new task, then enriches it.
    ///
    /// Fails only on validation or when another add is still in flight.
    pub async fn add_task(&self, draft: &TaskDraft) -> Result<AddReport, ClarityError> {
        let _guard = SubmitGuard::acquire(&self.submitting)?;

        let mut task = lifecycle::create(draft, Utc::now())?;
        let past_tasks = {
            let mut store = self.store();
            let past = schedule::past_tasks(store.tasks());
            store.insert(task.clone());
            past
        };
        info!(id = %task.id, due = ?task.due_date, "task added");

        let mut notices = Vec::new();
        let mut enrichment_failed = false;

        let estimate_req = EstimateRequest {
            task_description: task.description.clone(),
            past_tasks,
        };
        match self.estimator.estimate_completion_time(&estimate_req).await {
            Ok(estimate) => {
                let minutes = estimate.estimated_completion_time_minutes;
                debug!(
                    id = %task.id,
                    minutes,
                    reasoning = %estimate.reasoning,
                    "estimate received"
                );
                match self.store().attach_estimate(&task.id, minutes) {
                    Some(updated) => {
                        task = updated;
                        notices.push(Notice::new(
                            NoticeLevel::Info,
                            "Task Added",
                            format!("Estimated time: {minutes} minutes."),
                        ));
                    }
                    None => debug!(id = %task.id, "task gone before its estimate arrived"),
                }
            }
            Err(e) => {
                warn!(id = %task.id, error = %e, "completion estimate unavailable");
                enrichment_failed = true;
            }
        }

        let mut overload = None;
        if let Some(due) = task.due_date {
            let overload_req = {
                let store = self.store();
                OverloadRequest {
                    tasks: schedule::scheduled_on(store.tasks(), due.date()),
                    historical_completion_times: schedule::historical_completion_times(
                        store.tasks(),
                    ),
                }
            };
            match self.estimator.warn_overloaded_schedule(&overload_req).await {
                Ok(response) => {
                    if response.is_overloaded {
                        info!(
                            date = %due.date(),
                            total = response.estimated_completion_time,
                            "day looks overloaded"
                        );
                        notices.push(Notice::new(
                            NoticeLevel::Warning,
                            "Schedule Alert",
                            response.warning_message.clone(),
                        ));
                    }
                    overload = Some(response);
                }
                Err(e) => {
                    warn!(date = %due.date(), error = %e, "overload check unavailable");
                    enrichment_failed = true;
                }
            }
        }

        if enrichment_failed {
            notices.push(Notice::new(
                NoticeLevel::Error,
                "Error",
                "Could not get AI-powered estimations. Task added with default values.",
            ));
        }

        Ok(AddReport {
            task,
            overload,
            notices,
        })
    }

    pub fn toggle_complete(&self, id: &str) -> Result<Task, ClarityError> {
        let task = self.store().toggle(id, Utc::now())?;
        info!(id = %task.id, state = %task.state(), "task toggled");
        Ok(task)
    }

    pub fn update_task(&self, id: &str, patch: &TaskPatch) -> Result<(Task, Notice), ClarityError> {
        let task = self.store().edit(id, patch)?;
        info!(id = %task.id, "task updated");
        Ok((
            task,
            Notice::new(NoticeLevel::Info, "Task Updated", "Your changes have been saved."),
        ))
    }

    pub fn delete_task(&self, id: &str) -> Result<(Task, Notice), ClarityError> {
        let task = self.store().remove(id)?;
        info!(id = %task.id, "task deleted");
        Ok((
            task,
            Notice::new(NoticeLevel::Info, "Task Deleted", "The task has been removed."),
        ))
    }

    fn store(&self) -> MutexGuard<'_, TaskStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EstimationError, ValidationError};
    use crate::estimate::{EstimateResponse, HeuristicEstimator, OverloadPolicy};
    use crate::store::{MemorySlot, STORAGE_KEY};
    use chrono::{NaiveDate, NaiveTime};
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Scripted estimator that records what it was asked.
    #[derive(Default)]
    struct MockEstimator {
        fail_estimate: bool,
        fail_overload: bool,
        overload_capacity: Option<u64>,
        estimates: Mutex<Vec<EstimateRequest>>,
        overloads: Mutex<Vec<OverloadRequest>>,
    }

    impl Estimator for MockEstimator {
        async fn estimate_completion_time(
            &self,
            req: &EstimateRequest,
        ) -> Result<EstimateResponse, EstimationError> {
            self.estimates.lock().unwrap().push(req.clone());
            if self.fail_estimate {
                return Err(EstimationError::Malformed("mock".into()));
            }
            Ok(EstimateResponse {
                estimated_completion_time_minutes: 35,
                reasoning: "mock".into(),
            })
        }

        async fn warn_overloaded_schedule(
            &self,
            req: &OverloadRequest,
        ) -> Result<OverloadResponse, EstimationError> {
            self.overloads.lock().unwrap().push(req.clone());
            if self.fail_overload {
                return Err(EstimationError::Malformed("mock".into()));
            }
            let policy = OverloadPolicy {
                daily_capacity_minutes: self.overload_capacity.unwrap_or(480),
                default_task_minutes: 60,
            };
            Ok(policy.assess(req, None, None))
        }
    }

    /// Estimator that parks until released, to observe the in-flight state.
    struct GatedEstimator {
        entered: Arc<Notify>,
        release: Arc<Notify>,
    }

    impl Estimator for GatedEstimator {
        async fn estimate_completion_time(
            &self,
            _req: &EstimateRequest,
        ) -> Result<EstimateResponse, EstimationError> {
            self.entered.notify_one();
            self.release.notified().await;
            Ok(EstimateResponse {
                estimated_completion_time_minutes: 10,
                reasoning: String::new(),
            })
        }

        async fn warn_overloaded_schedule(
            &self,
            _req: &OverloadRequest,
        ) -> Result<OverloadResponse, EstimationError> {
            Ok(OverloadResponse::clear())
        }
    }

    fn planner(estimator: MockEstimator) -> (Planner<MockEstimator>, MemorySlot) {
        let slot = MemorySlot::new();
        (Planner::new(TaskStore::open(slot.clone()), estimator), slot)
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[tokio::test]
    async fn add_without_due_date_estimates_but_skips_overload() {
        let (planner, slot) = planner(MockEstimator::default());
        let before = Utc::now();
        let report = planner.add_task(&TaskDraft::new("Write report")).await.unwrap();

        assert_eq!(report.task.description, "Write report");
        assert!(!report.task.completed);
        assert!(report.task.created_at >= before && report.task.created_at <= Utc::now());
        assert_eq!(report.task.estimated_time, Some(35));
        assert!(report.overload.is_none());
        assert_eq!(
            report.notices,
            vec![Notice::new(
                NoticeLevel::Info,
                "Task Added",
                "Estimated time: 35 minutes."
            )]
        );

        let est = planner.estimator();
        let estimates = est.estimates.lock().unwrap();
        assert_eq!(estimates.len(), 1);
        assert_eq!(estimates[0].task_description, "Write report");
        assert!(estimates[0].past_tasks.is_empty());
        assert!(est.overloads.lock().unwrap().is_empty());

        let stored = TaskStore::open(slot);
        assert_eq!(stored.tasks(), &[report.task]);
    }

    #[tokio::test]
    async fn validation_failure_creates_nothing() {
        let (planner, slot) = planner(MockEstimator::default());

        let err = planner.add_task(&TaskDraft::new("ab")).await.unwrap_err();
        assert!(matches!(
            err,
            ClarityError::Validation(ValidationError::DescriptionTooShort { min: 3 })
        ));

        let time_only =
            TaskDraft::new("Call bank").due_at(NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        let err = planner.add_task(&time_only).await.unwrap_err();
        assert!(matches!(
            err,
            ClarityError::Validation(ValidationError::TimeWithoutDate)
        ));

        assert!(planner.sorted_tasks().is_empty());
        assert!(slot.get(STORAGE_KEY).is_none());
        assert!(planner.estimator().estimates.lock().unwrap().is_empty());
        assert!(!planner.is_submitting());
    }

    #[tokio::test]
    async fn estimate_failure_still_adds_task() {
        let (planner, slot) = planner(MockEstimator {
            fail_estimate: true,
            ..Default::default()
        });
        let report = planner.add_task(&TaskDraft::new("Write report")).await.unwrap();

        assert!(report.task.estimated_time.is_none());
        assert_eq!(report.notices.len(), 1);
        assert_eq!(report.notices[0].level, NoticeLevel::Error);
        assert_eq!(TaskStore::open(slot).tasks().len(), 1);
    }

    #[tokio::test]
    async fn enrichment_failures_report_once() {
        let (planner, _slot) = planner(MockEstimator {
            fail_estimate: true,
            fail_overload: true,
            ..Default::default()
        });
        let report = planner
            .add_task(&TaskDraft::new("Write report").due_on(june(1)))
            .await
            .unwrap();

        let errors = report
            .notices
            .iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .count();
        assert_eq!(errors, 1);
        assert!(report.overload.is_none());
        assert_eq!(planner.sorted_tasks().len(), 1);
    }

    #[tokio::test]
    async fn two_tasks_on_same_day_trigger_overload_check() {
        let (planner, _slot) = planner(MockEstimator {
            overload_capacity: Some(90),
            ..Default::default()
        });
        planner
            .add_task(&TaskDraft::new("Write report").due_on(june(1)))
            .await
            .unwrap();
        let report = planner
            .add_task(&TaskDraft::new("Prepare slides").due_on(june(1)))
            .await
            .unwrap();

        let overloads = planner.estimator().overloads.lock().unwrap();
        assert_eq!(overloads.len(), 2);
        let last = &overloads[1];
        let names: Vec<&str> = last.tasks.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(names, vec!["Write report", "Prepare slides"]);
        assert!(last.tasks.iter().all(|t| t.due_date == june(1)));
        assert!(last.historical_completion_times.is_empty());

        let overload = report.overload.unwrap();
        assert!(overload.is_overloaded);
        assert_eq!(overload.estimated_completion_time, 120);
        assert!(!overload.warning_message.is_empty());
        assert!(report
            .notices
            .iter()
            .any(|n| n.level == NoticeLevel::Warning && n.title == "Schedule Alert"));
    }

    #[tokio::test]
    async fn overload_check_scoped_to_pending_tasks_on_that_day() {
        let (planner, _slot) = planner(MockEstimator::default());
        let done = planner
            .add_task(&TaskDraft::new("Already done").due_on(june(1)))
            .await
            .unwrap()
            .task;
        planner.toggle_complete(&done.id).unwrap();
        planner
            .add_task(&TaskDraft::new("Other day").due_on(june(2)))
            .await
            .unwrap();
        planner
            .add_task(&TaskDraft::new("Target").due_on(june(1)))
            .await
            .unwrap();

        let overloads = planner.estimator().overloads.lock().unwrap();
        let last = overloads.last().unwrap();
        assert_eq!(last.tasks.len(), 1);
        assert_eq!(last.tasks[0].description, "Target");
        assert_eq!(last.historical_completion_times.len(), 1);
    }

    #[tokio::test]
    async fn past_tasks_come_from_completed_history() {
        let (planner, _slot) = planner(MockEstimator::default());
        let first = planner.add_task(&TaskDraft::new("Write memo")).await.unwrap().task;
        planner.toggle_complete(&first.id).unwrap();
        planner.add_task(&TaskDraft::new("Write report")).await.unwrap();

        let estimates = planner.estimator().estimates.lock().unwrap();
        let past = &estimates[1].past_tasks;
        assert_eq!(past.len(), 1);
        assert_eq!(past[0].description, "Write memo");
    }

    #[tokio::test]
    async fn second_submission_rejected_while_first_in_flight() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let planner = Planner::new(
            TaskStore::open(MemorySlot::new()),
            GatedEstimator {
                entered: entered.clone(),
                release: release.clone(),
            },
        );

        let first_draft = TaskDraft::new("First task");
        let first = planner.add_task(&first_draft);
        let second = async {
            entered.notified().await;
            assert!(planner.is_submitting());
            let result = planner.add_task(&TaskDraft::new("Second task")).await;
            release.notify_one();
            result
        };
        let (first, second) = tokio::join!(first, second);

        assert!(first.is_ok());
        assert!(matches!(second, Err(ClarityError::SubmissionInFlight)));
        assert!(!planner.is_submitting());
        assert_eq!(planner.sorted_tasks().len(), 1);

        // The guard is released, so the next add goes through.
        release.notify_one();
        assert!(planner.add_task(&TaskDraft::new("Third task")).await.is_ok());
    }

    #[tokio::test]
    async fn deleted_before_estimate_discards_result() {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let planner = Planner::new(
            TaskStore::open(MemorySlot::new()),
            GatedEstimator {
                entered: entered.clone(),
                release: release.clone(),
            },
        );

        let draft = TaskDraft::new("Short lived");
        let add = planner.add_task(&draft);
        let delete = async {
            entered.notified().await;
            let id = planner.sorted_tasks()[0].id.clone();
            planner.delete_task(&id).unwrap();
            release.notify_one();
        };
        let (report, ()) = tokio::join!(add, delete);

        let report = report.unwrap();
        assert!(report.task.estimated_time.is_none());
        assert!(report.notices.is_empty());
        assert!(planner.sorted_tasks().is_empty());
    }

    #[tokio::test]
    async fn toggle_update_delete_flow() {
        let (planner, _slot) = planner(MockEstimator::default());
        let task = planner.add_task(&TaskDraft::new("Write report")).await.unwrap().task;
        let id = planner.resolve_id(&task.id[..8]).unwrap();
        assert_eq!(id, task.id);

        let done = planner.toggle_complete(&id).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert!(done.completion_time_minutes.is_some());

        let undone = planner.toggle_complete(&id).unwrap();
        assert!(!undone.completed);
        assert!(undone.completed_at.is_none());

        let patch = TaskPatch {
            description: Some("Write final report".into()),
            ..Default::default()
        };
        let (updated, notice) = planner.update_task(&id, &patch).unwrap();
        assert_eq!(updated.description, "Write final report");
        assert_eq!(notice.title, "Task Updated");

        let (deleted, notice) = planner.delete_task(&id).unwrap();
        assert_eq!(deleted.id, id);
        assert_eq!(notice.to_string(), "Task Deleted: The task has been removed.");
        assert!(matches!(
            planner.toggle_complete(&id),
            Err(ClarityError::TaskNotFound(_))
        ));
    }

    #[tokio::test]
    async fn heuristic_backend_end_to_end() {
        let planner = Planner::new(
            TaskStore::open(MemorySlot::new()),
            HeuristicEstimator::default(),
        );
        let report = planner.add_task(&TaskDraft::new("Write report")).await.unwrap();
        assert_eq!(report.task.estimated_time, Some(25));
    }
}

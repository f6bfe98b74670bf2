//! Pure transitions for a single task: create, toggle, edit, delete.
//!
//! Nothing here touches storage or the clock; callers pass `now` in.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::model::{DueChange, DueDate, Task, TaskDraft, TaskPatch, TaskState};
use crate::error::ValidationError;

/// Minimum description length, counted in characters after trimming.
pub const MIN_DESCRIPTION_CHARS: usize = 3;

/// Trims `raw` and checks its length.
pub fn validate_description(raw: &str) -> Result<String, ValidationError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < MIN_DESCRIPTION_CHARS {
        return Err(ValidationError::DescriptionTooShort {
            min: MIN_DESCRIPTION_CHARS,
        });
    }
    Ok(trimmed.to_string())
}

/// Combines the form's separate date and time inputs.
pub fn resolve_due(
    date: Option<NaiveDate>,
    time: Option<NaiveTime>,
) -> Result<Option<DueDate>, ValidationError> {
    match (date, time) {
        (None, None) => Ok(None),
        (None, Some(_)) => Err(ValidationError::TimeWithoutDate),
        (Some(date), None) => Ok(Some(DueDate::on(date))),
        (Some(date), Some(time)) => Ok(Some(DueDate::at(date, time))),
    }
}

/// Builds a new pending task, or rejects the draft without constructing one.
pub fn create(draft: &TaskDraft, now: DateTime<Utc>) -> Result<Task, ValidationError> {
    let description = validate_description(&draft.description)?;
    let due_date = resolve_due(draft.due_date, draft.due_time)?;

    Ok(Task {
        id: Uuid::new_v4().to_string(),
        description,
        completed: false,
        created_at: now,
        due_date,
        estimated_time: None,
        completed_at: None,
        completion_time_minutes: None,
    })
}

/// Whole minutes between creation and completion, rounded half up.
/// A completion stamped before creation (clock skew) counts as zero.
pub fn completion_minutes(created_at: DateTime<Utc>, completed_at: DateTime<Utc>) -> u64 {
    let elapsed_ms = (completed_at - created_at).num_milliseconds().max(0) as u64;
    (elapsed_ms + 30_000) / 60_000
}

/// Flips the task between pending and completed and returns the new state.
pub fn toggle(task: &mut Task, now: DateTime<Utc>) -> TaskState {
    match task.state() {
        TaskState::Pending => {
            task.completed = true;
            task.completed_at = Some(now);
            task.completion_time_minutes = Some(completion_minutes(task.created_at, now));
        }
        TaskState::Completed => {
            task.completed = false;
            task.completed_at = None;
            task.completion_time_minutes = None;
        }
    }
    task.state()
}

/// Applies `patch` in place. Everything is validated before the task is
/// touched, so a rejected edit leaves it unchanged.
pub fn edit(task: &mut Task, patch: &TaskPatch) -> Result<(), ValidationError> {
    let description = patch
        .description
        .as_deref()
        .map(validate_description)
        .transpose()?;

    let due_date = match patch.due {
        DueChange::Keep => task.due_date,
        DueChange::Clear => None,
        DueChange::Set { date: None, time: None } => task.due_date,
        DueChange::Set { date, time } => {
            resolve_due(date.or_else(|| task.due_date.map(|due| due.date())), time)?
        }
    };

    if let Some(description) = description {
        task.description = description;
    }
    task.due_date = due_date;
    Ok(())
}

/// Removes the task with `id`, returning it if it existed.
pub fn delete(tasks: &mut Vec<Task>, id: &str) -> Option<Task> {
    let index = tasks.iter().position(|task| task.id == id)?;
    Some(tasks.remove(index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2024-06-01T09:00:00Z".parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn create_produces_pending_task() {
        let task = create(&TaskDraft::new("  Write report  "), now()).unwrap();
        assert_eq!(task.description, "Write report");
        assert!(!task.completed);
        assert_eq!(task.state(), TaskState::Pending);
        assert_eq!(task.created_at, now());
        assert!(task.due_date.is_none());
        assert!(task.estimated_time.is_none());
        assert!(task.completed_at.is_none());
        assert!(task.completion_time_minutes.is_none());
    }

    #[test]
    fn create_assigns_fresh_ids() {
        let a = create(&TaskDraft::new("first"), now()).unwrap();
        let b = create(&TaskDraft::new("first"), now()).unwrap();
        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
    }

    #[test]
    fn create_rejects_short_description() {
        for raw in ["", "ab", "   ab   ", "\t\n"] {
            let err = create(&TaskDraft::new(raw), now()).unwrap_err();
            assert_eq!(err, ValidationError::DescriptionTooShort { min: 3 });
        }
        assert!(create(&TaskDraft::new(" abc "), now()).is_ok());
    }

    #[test]
    fn description_length_counts_characters_not_bytes() {
        assert!(validate_description("éé").is_err());
        assert_eq!(validate_description("ééé").unwrap(), "ééé");
    }

    #[test]
    fn create_rejects_time_without_date() {
        let draft = TaskDraft::new("Call the bank").due_at(time(10, 0));
        assert_eq!(
            create(&draft, now()).unwrap_err(),
            ValidationError::TimeWithoutDate
        );
    }

    #[test]
    fn create_combines_date_and_time() {
        let draft = TaskDraft::new("Call the bank")
            .due_on(date(2024, 6, 3))
            .due_at(time(10, 15));
        let task = create(&draft, now()).unwrap();
        assert_eq!(task.due_date, Some(DueDate::at(date(2024, 6, 3), time(10, 15))));
    }

    #[test]
    fn toggle_records_completion_time() {
        let mut task = create(&TaskDraft::new("Write report"), now()).unwrap();
        let later = now() + Duration::seconds(45 * 60 + 31);

        assert_eq!(toggle(&mut task, later), TaskState::Completed);
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(later));
        assert_eq!(task.completion_time_minutes, Some(46));
    }

    #[test]
    fn toggle_back_clears_completion_fields() {
        let mut task = create(&TaskDraft::new("Write report"), now()).unwrap();
        toggle(&mut task, now() + Duration::minutes(5));

        assert_eq!(toggle(&mut task, now() + Duration::minutes(6)), TaskState::Pending);
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.completion_time_minutes.is_none());
    }

    #[test]
    fn double_toggle_restores_pending_task() {
        let original = create(&TaskDraft::new("Write report"), now()).unwrap();
        let mut task = original.clone();
        toggle(&mut task, now() + Duration::minutes(10));
        toggle(&mut task, now() + Duration::minutes(11));
        assert_eq!(task, original);
    }

    #[test]
    fn double_toggle_restores_completed_task() {
        let done_at = now() + Duration::minutes(20);
        let mut original = create(&TaskDraft::new("Write report"), now()).unwrap();
        toggle(&mut original, done_at);

        let mut task = original.clone();
        toggle(&mut task, now() + Duration::minutes(30));
        toggle(&mut task, done_at);
        assert_eq!(task, original);
    }

    #[test]
    fn completion_minutes_rounds_and_clamps() {
        let start = now();
        assert_eq!(completion_minutes(start, start), 0);
        assert_eq!(completion_minutes(start, start + Duration::seconds(29)), 0);
        assert_eq!(completion_minutes(start, start + Duration::seconds(30)), 1);
        assert_eq!(completion_minutes(start, start + Duration::minutes(90)), 90);
        assert_eq!(completion_minutes(start, start - Duration::minutes(5)), 0);
    }

    #[test]
    fn edit_replaces_description_and_keeps_timestamps() {
        let mut task = create(&TaskDraft::new("Write report"), now()).unwrap();
        toggle(&mut task, now() + Duration::minutes(15));
        let before = task.clone();

        let patch = TaskPatch {
            description: Some("  Write the quarterly report ".into()),
            ..Default::default()
        };
        edit(&mut task, &patch).unwrap();

        assert_eq!(task.description, "Write the quarterly report");
        assert_eq!(task.completed, before.completed);
        assert_eq!(task.created_at, before.created_at);
        assert_eq!(task.completed_at, before.completed_at);
        assert_eq!(task.completion_time_minutes, before.completion_time_minutes);
    }

    #[test]
    fn edit_rejects_short_description_without_mutating() {
        let mut task = create(&TaskDraft::new("Write report").due_on(date(2024, 6, 2)), now())
            .unwrap();
        let before = task.clone();
        let patch = TaskPatch {
            description: Some("no".into()),
            due: DueChange::Clear,
        };
        assert!(edit(&mut task, &patch).is_err());
        assert_eq!(task, before);
    }

    #[test]
    fn edit_due_changes() {
        let mut task = create(&TaskDraft::new("Write report"), now()).unwrap();

        // A bare time needs a date somewhere.
        let time_only = TaskPatch {
            due: DueChange::Set {
                date: None,
                time: Some(time(9, 0)),
            },
            ..Default::default()
        };
        assert_eq!(
            edit(&mut task, &time_only).unwrap_err(),
            ValidationError::TimeWithoutDate
        );

        let set_date = TaskPatch {
            due: DueChange::Set {
                date: Some(date(2024, 6, 4)),
                time: None,
            },
            ..Default::default()
        };
        edit(&mut task, &set_date).unwrap();
        assert_eq!(task.due_date, Some(DueDate::on(date(2024, 6, 4))));

        edit(&mut task, &time_only).unwrap();
        assert_eq!(task.due_date, Some(DueDate::at(date(2024, 6, 4), time(9, 0))));

        edit(&mut task, &TaskPatch::default()).unwrap();
        assert_eq!(task.due_date, Some(DueDate::at(date(2024, 6, 4), time(9, 0))));

        let clear = TaskPatch {
            due: DueChange::Clear,
            ..Default::default()
        };
        edit(&mut task, &clear).unwrap();
        assert!(task.due_date.is_none());
    }

    #[test]
    fn delete_removes_only_the_matching_task() {
        let a = create(&TaskDraft::new("first task"), now()).unwrap();
        let b = create(&TaskDraft::new("second task"), now()).unwrap();
        let mut tasks = vec![a.clone(), b.clone()];

        assert_eq!(delete(&mut tasks, &a.id), Some(a));
        assert_eq!(tasks, vec![b.clone()]);
        assert_eq!(delete(&mut tasks, "missing"), None);
        assert_eq!(tasks, vec![b]);
    }
}

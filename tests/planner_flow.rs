use chrono::NaiveDate;

use clarity::estimate::{HeuristicEstimator, OverloadPolicy};
use clarity::{FileSlot, NoticeLevel, Planner, STORAGE_KEY, SlotBackend, TaskDraft, TaskStore};

fn june_first() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
}

#[tokio::test]
async fn add_without_due_date_gets_estimate_and_no_overload_check() {
    let dir = tempfile::tempdir().unwrap();
    let planner = Planner::new(
        TaskStore::open(FileSlot::new(dir.path())),
        HeuristicEstimator::default(),
    );

    let report = planner.add_task(&TaskDraft::new("Write report")).await.unwrap();
    assert!(report.task.estimated_time.is_some());
    assert!(report.overload.is_none());
    assert!(report.notices.iter().all(|n| n.level == NoticeLevel::Info));

    let reopened = TaskStore::open(FileSlot::new(dir.path()));
    assert_eq!(reopened.tasks(), &[report.task]);
}

#[tokio::test]
async fn two_tasks_due_same_day_with_tight_capacity_warn() {
    let dir = tempfile::tempdir().unwrap();
    let planner = Planner::new(
        TaskStore::open(FileSlot::new(dir.path())),
        HeuristicEstimator::new(OverloadPolicy {
            daily_capacity_minutes: 90,
            default_task_minutes: 60,
        }),
    );

    let first = planner
        .add_task(&TaskDraft::new("Write report").due_on(june_first()))
        .await
        .unwrap();
    assert!(!first.overload.unwrap().is_overloaded);

    let second = planner
        .add_task(&TaskDraft::new("Prepare slides").due_on(june_first()))
        .await
        .unwrap();
    let overload = second.overload.unwrap();
    assert!(overload.is_overloaded);
    assert_eq!(overload.estimated_completion_time, 120);
    assert!(!overload.warning_message.is_empty());
}

#[tokio::test]
async fn two_tasks_due_same_day_fit_default_capacity() {
    let planner = Planner::new(
        TaskStore::open(clarity::MemorySlot::new()),
        HeuristicEstimator::default(),
    );
    for description in ["Write report", "Prepare slides"] {
        planner
            .add_task(&TaskDraft::new(description).due_on(june_first()))
            .await
            .unwrap();
    }
    let third = planner
        .add_task(&TaskDraft::new("Review budget").due_on(june_first()))
        .await
        .unwrap();
    let overload = third.overload.unwrap();
    assert!(!overload.is_overloaded);
    assert_eq!(overload.estimated_completion_time, 180);
    assert_eq!(overload.warning_message, "");
}

#[tokio::test]
async fn corrupted_slot_starts_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let slot = FileSlot::new(dir.path());
    slot.write(STORAGE_KEY, "{ this is not json").unwrap();

    let planner = Planner::new(TaskStore::open(slot.clone()), HeuristicEstimator::default());
    assert!(planner.sorted_tasks().is_empty());

    planner.add_task(&TaskDraft::new("Start over")).await.unwrap();
    assert_eq!(TaskStore::open(slot).tasks().len(), 1);
}

#[tokio::test]
async fn persisted_bytes_are_stable_across_reloads() {
    let dir = tempfile::tempdir().unwrap();
    let slot = FileSlot::new(dir.path());
    let planner = Planner::new(TaskStore::open(slot.clone()), HeuristicEstimator::default());
    let task = planner
        .add_task(&TaskDraft::new("Write report").due_on(june_first()))
        .await
        .unwrap()
        .task;
    planner.toggle_complete(&task.id).unwrap();

    let store = TaskStore::open(slot.clone());
    store.save(&store.load()).unwrap();
    let first = slot.read(STORAGE_KEY).unwrap().unwrap();
    store.save(&store.load()).unwrap();
    let second = slot.read(STORAGE_KEY).unwrap().unwrap();
    assert_eq!(first, second);
    assert!(first.contains("\"completionTimeMinutes\""));
}

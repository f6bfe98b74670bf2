//! Inputs for the estimator, derived from the current task list.

use chrono::NaiveDate;

use super::model::Task;
use crate::estimate::{PastTask, ScheduledTask};

/// Every completed task that has a recorded duration, in list order.
pub fn past_tasks(tasks: &[Task]) -> Vec<PastTask> {
    tasks
        .iter()
        .filter(|task| task.completed)
        .filter_map(|task| {
            task.completion_time_minutes.map(|minutes| PastTask {
                description: task.description.clone(),
                completion_time_minutes: minutes,
            })
        })
        .collect()
}

/// Recorded durations of completed tasks, in list order.
pub fn historical_completion_times(tasks: &[Task]) -> Vec<u64> {
    past_tasks(tasks)
        .into_iter()
        .map(|past| past.completion_time_minutes)
        .collect()
}

/// Pending tasks due on `date`, whatever their time of day.
pub fn scheduled_on(tasks: &[Task], date: NaiveDate) -> Vec<ScheduledTask> {
    tasks
        .iter()
        .filter(|task| !task.completed && task.is_due_on(date))
        .map(|task| ScheduledTask {
            description: task.description.clone(),
            due_date: date,
        })
        .collect()
}

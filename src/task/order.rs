//! Display order for the task list. Derived on every render, never stored.

use std::cmp::Ordering;

use super::model::Task;

/// Pending before completed. Pending tasks with a due date come first,
/// earliest due first; ties and undated tasks go newest first. The id is the
/// final tiebreak so the order is total.
pub fn compare(a: &Task, b: &Task) -> Ordering {
    a.completed
        .cmp(&b.completed)
        .then_with(|| {
            if a.completed {
                Ordering::Equal
            } else {
                match (&a.due_date, &b.due_date) {
                    (Some(x), Some(y)) => x.cmp(y),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            }
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// The tasks in display order. The input slice is left untouched.
pub fn sorted(tasks: &[Task]) -> Vec<&Task> {
    let mut view: Vec<&Task> = tasks.iter().collect();
    view.sort_by(|a, b| compare(a, b));
    view
}

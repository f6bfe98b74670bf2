//! The task record and the pure functions that move it through its
//! lifecycle, order it, and derive scheduling inputs from it.

pub mod lifecycle;
mod model;
pub mod order;
pub mod schedule;

pub use model::{DueChange, DueDate, ParseDueDateError, Task, TaskDraft, TaskPatch, TaskState};

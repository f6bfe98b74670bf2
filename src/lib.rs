//! Clarity: a personal to-do list with model-assisted completion estimates
//! and warnings for overloaded days.
//!
//! The pieces, leaf first: [`task`] holds the record and its pure lifecycle,
//! [`store`] persists the list in a key-value slot, [`estimate`] wraps the
//! two best-effort estimation calls, and [`planner`] ties them into the
//! add/toggle/edit/delete flows.

pub mod anthropic;
pub mod config;
pub mod error;
pub mod estimate;
pub mod planner;
pub mod store;
pub mod task;

pub use config::ClarityConfig;
pub use error::{ClarityError, EstimationError, PersistenceError, ValidationError};
pub use planner::{AddReport, Notice, NoticeLevel, Planner};
pub use store::{FileSlot, MemorySlot, STORAGE_KEY, SlotBackend, TaskStore};
pub use task::{DueChange, DueDate, Task, TaskDraft, TaskPatch, TaskState};

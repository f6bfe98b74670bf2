//! Request and response shapes for the two estimation calls.
//!
//! These are the validated, strongly typed forms. Whatever the model sends
//! back is parsed into looser raw structs first and only reaches these types
//! through [`validate_minutes`] and the overload policy.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EstimationError;

/// Upper bound for any minute count we accept from a model (one year).
pub const MAX_MINUTES: u64 = 525_600;

/// A completed task and how long it actually took.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastTask {
    pub description: String,
    pub completion_time_minutes: u64,
}

/// Input to `EstimateCompletionTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateRequest {
    /// Description of the task being added.
    pub task_description: String,
    /// Every completed task with a recorded duration. May be empty.
    pub past_tasks: Vec<PastTask>,
}

/// Validated output of `EstimateCompletionTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateResponse {
    /// Whole minutes, at most [`MAX_MINUTES`].
    pub estimated_completion_time_minutes: u64,
    /// Free text from the estimator; may be empty.
    pub reasoning: String,
}

/// A task as seen by the overload check: what it is and which day it is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTask {
    pub description: String,
    pub due_date: NaiveDate,
}

/// Input to `WarnOverloadedSchedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverloadRequest {
    /// Pending tasks sharing one due date, the new task included.
    pub tasks: Vec<ScheduledTask>,
    /// Durations of all completed tasks, in minutes.
    pub historical_completion_times: Vec<u64>,
}

/// Validated output of `WarnOverloadedSchedule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverloadResponse {
    pub is_overloaded: bool,
    /// Total minutes for all the day's tasks; 0 when there are none.
    pub estimated_completion_time: u64,
    /// Empty whenever `is_overloaded` is false.
    pub warning_message: String,
}

impl OverloadResponse {
    /// The fixed answer for a day with nothing on it.
    pub fn clear() -> Self {
        Self {
            is_overloaded: false,
            estimated_completion_time: 0,
            warning_message: String::new(),
        }
    }
}

/// Turns a model-supplied number into whole minutes, failing closed on
/// anything that is not a finite value in `0..=MAX_MINUTES`.
pub fn validate_minutes(field: &str, value: f64) -> Result<u64, EstimationError> {
    if !value.is_finite() {
        return Err(EstimationError::InvalidValue(format!(
            "{field} is not a finite number"
        )));
    }
    if value < 0.0 {
        return Err(EstimationError::InvalidValue(format!(
            "{field} is negative ({value})"
        )));
    }
    let minutes = value.round() as u64;
    if minutes > MAX_MINUTES {
        return Err(EstimationError::InvalidValue(format!(
            "{field} is implausibly large ({value})"
        )));
    }
    Ok(minutes)
}

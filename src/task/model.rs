use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// The two observable lifecycle states of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    /// Not done yet. Every task starts here.
    Pending,
    /// Marked done; `completedAt` and the duration are set.
    Completed,
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TaskState::Pending => write!(f, "pending"),
            TaskState::Completed => write!(f, "completed"),
        }
    }
}

/// A due date with an optional time of day, minute precision.
///
/// Serialized as `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM`. A time can never exist
/// without its date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DueDate {
    date: NaiveDate,
    time: Option<NaiveTime>,
}

impl DueDate {
    pub fn on(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    /// Seconds and sub-seconds are dropped.
    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        let time = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time);
        Self {
            date,
            time: Some(time),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time(&self) -> Option<NaiveTime> {
        self.time
    }
}

// A date-only due means "by the end of that day", so it sorts after every
// timed due on the same date.
impl Ord for DueDate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.time.is_none().cmp(&other.time.is_none()))
            .then_with(|| self.time.cmp(&other.time))
    }
}

impl PartialOrd for DueDate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for DueDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.time {
            Some(time) => write!(f, "{}T{}", self.date.format("%Y-%m-%d"), time.format("%H:%M")),
            None => write!(f, "{}", self.date.format("%Y-%m-%d")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid due date `{0}`, expected YYYY-MM-DD or YYYY-MM-DDTHH:MM")]
pub struct ParseDueDateError(String);

impl FromStr for DueDate {
    type Err = ParseDueDateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
            return Ok(Self::on(date));
        }
        ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
            .map(|dt| Self::at(dt.date(), dt.time()))
            .ok_or_else(|| ParseDueDateError(s.to_string()))
    }
}

impl TryFrom<String> for DueDate {
    type Error = ParseDueDateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DueDate> for String {
    fn from(due: DueDate) -> Self {
        due.to_string()
    }
}

/// A single to-do item, as persisted.
///
/// Fields are public for reading; transitions go through
/// [`lifecycle`](super::lifecycle) so the derived fields stay consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Random v4 UUID, fixed at creation.
    pub id: String,
    /// Trimmed, at least three characters.
    pub description: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DueDate>,
    /// Minutes, as returned by the estimator.
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub estimated_time: Option<u64>,
    /// Set exactly while `completed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    /// Whole minutes between creation and completion.
    #[serde(
        default,
        deserialize_with = "lenient_minutes",
        skip_serializing_if = "Option::is_none"
    )]
    pub completion_time_minutes: Option<u64>,
}

/// Accepts any JSON number for a minutes field: fractions are rounded and
/// negatives clamp to zero. Older lists stored raw model output here.
fn lenient_minutes<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw
        .filter(|minutes| minutes.is_finite())
        .map(|minutes| minutes.round().max(0.0) as u64))
}

impl Task {
    pub fn state(&self) -> TaskState {
        if self.completed {
            TaskState::Completed
        } else {
            TaskState::Pending
        }
    }

    /// True when the due date falls on `date`, whatever the time of day.
    pub fn is_due_on(&self, date: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due.date() == date)
    }
}

/// Raw input for a new task, straight from the form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskDraft {
    /// Untrimmed; validated when the task is created.
    pub description: String,
    pub due_date: Option<NaiveDate>,
    /// Only valid together with `due_date`.
    pub due_time: Option<NaiveTime>,
}

impl TaskDraft {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn due_on(mut self, date: NaiveDate) -> Self {
        self.due_date = Some(date);
        self
    }

    pub fn due_at(mut self, time: NaiveTime) -> Self {
        self.due_time = Some(time);
        self
    }
}

/// How an edit treats the due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DueChange {
    /// Leave the due date as it is.
    #[default]
    Keep,
    /// Remove the due date entirely.
    Clear,
    /// Replace the due. A missing `date` keeps the current date, so a bare
    /// time only works on a task that already has one.
    Set {
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
    },
}

/// An in-place edit of description and/or due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    /// New description, validated like a new task's.
    pub description: Option<String>,
    pub due: DueChange,
}

impl TaskPatch {
    /// A patch that would change nothing.
    pub fn is_empty(&self) -> bool {
        self.description.is_none() && self.due == DueChange::Keep
    }
}

//! The deterministic half of the overload check.
//!
//! Whether a day is overloaded is decided here, not by the model: the assumed
//! workload is compared with a fixed daily capacity. The model may contribute
//! a total and a friendlier message, nothing more.

use serde::{Deserialize, Serialize};

use super::types::{OverloadRequest, OverloadResponse};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverloadPolicy {
    /// Minutes of work that fit in one day.
    pub daily_capacity_minutes: u64,
    /// Assumed duration of each task when there is no history at all.
    pub default_task_minutes: u64,
}

impl Default for OverloadPolicy {
    fn default() -> Self {
        Self {
            daily_capacity_minutes: 480,
            default_task_minutes: 60,
        }
    }
}

/// Rounded integer mean, `None` for an empty slice.
pub(crate) fn mean_minutes(values: &[u64]) -> Option<u64> {
    if values.is_empty() {
        return None;
    }
    let count = values.len() as u64;
    let sum: u64 = values.iter().sum();
    Some((sum + count / 2) / count)
}

impl OverloadPolicy {
    /// Total minutes for `task_count` tasks judged from history alone:
    /// the historical mean per task, or the default when there is none.
    pub fn assumed_total(&self, task_count: usize, history: &[u64]) -> u64 {
        let per_task = mean_minutes(history).unwrap_or(self.default_task_minutes);
        per_task.saturating_mul(task_count as u64)
    }

    pub fn is_overloaded(&self, total_minutes: u64) -> bool {
        total_minutes > self.daily_capacity_minutes
    }

    /// Produces the final answer for `req`.
    ///
    /// `model_total` replaces the history-based total only when there is
    /// history to reason from; without it every task counts as
    /// `default_task_minutes`. `model_message` is used as the warning when it
    /// is non-empty and the day is overloaded.
    pub fn assess(
        &self,
        req: &OverloadRequest,
        model_total: Option<u64>,
        model_message: Option<&str>,
    ) -> OverloadResponse {
        if req.tasks.is_empty() {
            return OverloadResponse::clear();
        }

        let count = req.tasks.len();
        let total = if req.historical_completion_times.is_empty() {
            self.assumed_total(count, &[])
        } else {
            model_total
                .unwrap_or_else(|| self.assumed_total(count, &req.historical_completion_times))
        };

        if !self.is_overloaded(total) {
            return OverloadResponse {
                is_overloaded: false,
                estimated_completion_time: total,
                warning_message: String::new(),
            };
        }

        let warning_message = model_message
            .map(str::trim)
            .filter(|msg| !msg.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.default_warning(count, total));

        OverloadResponse {
            is_overloaded: true,
            estimated_completion_time: total,
            warning_message,
        }
    }

    fn default_warning(&self, task_count: usize, total: u64) -> String {
        format!(
            "Warning: You may be overcommitting yourself on this day. \
             The {task_count} tasks due are estimated to take {total} minutes, \
             more than the {} minutes you can usually get through.",
            self.daily_capacity_minutes
        )
    }
}

//! Offline estimator used when no model is configured.
//!
//! Keyword overlap against past tasks stands in for the model's "similar
//! tasks" judgement; with no history the description length decides.

use std::collections::HashSet;

use super::policy::{OverloadPolicy, mean_minutes};
use super::types::{EstimateRequest, EstimateResponse, OverloadRequest, OverloadResponse};
use super::Estimator;
use crate::error::EstimationError;

/// Base minutes for a task we know nothing about.
const BASE_MINUTES: u64 = 15;
/// Extra minutes per word of description.
const MINUTES_PER_WORD: u64 = 5;
/// Ceiling for a description-only guess.
const MAX_GUESS_MINUTES: u64 = 120;

#[derive(Debug, Clone, Default)]
pub struct HeuristicEstimator {
    policy: OverloadPolicy,
}

impl HeuristicEstimator {
    pub fn new(policy: OverloadPolicy) -> Self {
        Self { policy }
    }

    /// Synchronous core of [`Estimator::estimate_completion_time`].
    pub fn estimate(&self, req: &EstimateRequest) -> EstimateResponse {
        let target = keywords(&req.task_description);

        let scored: Vec<(usize, u64)> = req
            .past_tasks
            .iter()
            .map(|past| {
                let overlap = keywords(&past.description).intersection(&target).count();
                (overlap, past.completion_time_minutes)
            })
            .collect();

        let best = scored.iter().map(|&(overlap, _)| overlap).max().unwrap_or(0);
        if best > 0 {
            let similar: Vec<u64> = scored
                .iter()
                .filter(|&&(overlap, _)| overlap == best)
                .map(|&(_, minutes)| minutes)
                .collect();
            if let Some(minutes) = mean_minutes(&similar) {
                return EstimateResponse {
                    estimated_completion_time_minutes: minutes,
                    reasoning: format!(
                        "Average of {} similar past task(s) sharing {best} keyword(s).",
                        similar.len()
                    ),
                };
            }
        }

        let history: Vec<u64> = scored.iter().map(|&(_, minutes)| minutes).collect();
        if let Some(minutes) = mean_minutes(&history) {
            return EstimateResponse {
                estimated_completion_time_minutes: minutes,
                reasoning: format!(
                    "No similar past tasks; average of all {} completed tasks.",
                    history.len()
                ),
            };
        }

        let words = req.task_description.split_whitespace().count() as u64;
        let minutes = (BASE_MINUTES + MINUTES_PER_WORD * words).min(MAX_GUESS_MINUTES);
        EstimateResponse {
            estimated_completion_time_minutes: minutes,
            reasoning: "No task history yet; estimated from the description length.".to_string(),
        }
    }
}

impl Estimator for HeuristicEstimator {
    async fn estimate_completion_time(
        &self,
        req: &EstimateRequest,
    ) -> Result<EstimateResponse, EstimationError> {
        Ok(self.estimate(req))
    }

    async fn warn_overloaded_schedule(
        &self,
        req: &OverloadRequest,
    ) -> Result<OverloadResponse, EstimationError> {
        Ok(self.policy.assess(req, None, None))
    }
}

/// Lowercased words of three or more characters.
fn keywords(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| word.chars().count() >= 3)
        .map(str::to_lowercase)
        .collect()
}

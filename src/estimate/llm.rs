//! Model-backed estimator speaking the Anthropic Messages API.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::Estimator;
use super::policy::OverloadPolicy;
use super::types::{
    EstimateRequest, EstimateResponse, OverloadRequest, OverloadResponse, validate_minutes,
};
use crate::anthropic::{MessageSender, MessagesRequest};
use crate::error::EstimationError;

/// Model used when `clarity.toml` names none.
pub const DEFAULT_MODEL: &str = "claude-haiku-4-5-20251001";

const SYSTEM_PROMPT: &str = "You help a person plan their personal to-do list. \
    Answer with a single JSON object and nothing else.";

/// What the model is asked to return for a single-task estimate.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEstimate {
    estimated_completion_time_minutes: f64,
    #[serde(default)]
    reasoning: Option<String>,
}

/// What the model is asked to return for an overload check.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawOverload {
    #[serde(default)]
    is_overloaded: Option<bool>,
    #[serde(default)]
    estimated_completion_time: Option<f64>,
    #[serde(default)]
    warning_message: Option<String>,
}

/// Estimator that asks a model through any [`MessageSender`].
///
/// Replies are parsed into loose structs first and then validated, so a
/// reply that is off in shape or range becomes an [`EstimationError`]
/// rather than a bogus estimate.
pub struct LlmEstimator<S> {
    sender: S,
    model: String,
    max_tokens: u32,
    policy: OverloadPolicy,
}

impl<S: MessageSender> LlmEstimator<S> {
    pub fn new(
        sender: S,
        model: impl Into<String>,
        max_tokens: u32,
        policy: OverloadPolicy,
    ) -> Self {
        Self {
            sender,
            model: model.into(),
            max_tokens,
            policy,
        }
    }

    async fn ask<T: DeserializeOwned>(&self, prompt: String) -> Result<T, EstimationError> {
        let req = MessagesRequest::single_turn(&self.model, self.max_tokens, prompt)
            .with_system(SYSTEM_PROMPT)
            .with_temperature(0.0);
        let response = match self.sender.send_message(&req).await {
            Ok(response) => response,
            Err(e) => {
                if e.is_rejection() {
                    warn!(model = %self.model, error = %e, "model service rejected the request");
                } else {
                    debug!(model = %self.model, error = %e, "model request did not complete");
                }
                return Err(e.into());
            }
        };
        let text = response.text();
        debug!(stop_reason = ?response.stop_reason, "model replied");
        parse_json_reply(&text)
    }
}

impl<S: MessageSender> Estimator for LlmEstimator<S> {
    async fn estimate_completion_time(
        &self,
        req: &EstimateRequest,
    ) -> Result<EstimateResponse, EstimationError> {
        let raw: RawEstimate = self.ask(estimate_prompt(req)).await?;
        let minutes = validate_minutes(
            "estimatedCompletionTimeMinutes",
            raw.estimated_completion_time_minutes,
        )?;
        Ok(EstimateResponse {
            estimated_completion_time_minutes: minutes,
            reasoning: raw.reasoning.unwrap_or_default(),
        })
    }

    async fn warn_overloaded_schedule(
        &self,
        req: &OverloadRequest,
    ) -> Result<OverloadResponse, EstimationError> {
        if req.tasks.is_empty() {
            return Ok(OverloadResponse::clear());
        }

        let raw: RawOverload = self.ask(overload_prompt(req)).await?;
        // Without history the total is fixed per task; the model's is unused.
        let model_total = if req.historical_completion_times.is_empty() {
            None
        } else {
            let total = raw.estimated_completion_time.ok_or_else(|| {
                EstimationError::Malformed("missing estimatedCompletionTime".to_string())
            })?;
            Some(validate_minutes("estimatedCompletionTime", total)?)
        };
        let response = self
            .policy
            .assess(req, model_total, raw.warning_message.as_deref());

        if raw.is_overloaded.is_some_and(|flag| flag != response.is_overloaded) {
            warn!(
                model_says = ?raw.is_overloaded,
                policy_says = response.is_overloaded,
                total = response.estimated_completion_time,
                "model overload verdict overridden by capacity policy"
            );
        }
        Ok(response)
    }
}

/// Pulls the JSON object out of a reply that may be wrapped in a code fence
/// or surrounded by prose.
fn extract_json(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start <= end).then(|| &text[start..=end])
}

fn parse_json_reply<T: DeserializeOwned>(text: &str) -> Result<T, EstimationError> {
    let json = extract_json(text)
        .ok_or_else(|| EstimationError::Malformed("no JSON object in reply".to_string()))?;
    serde_json::from_str(json).map_err(|e| EstimationError::Malformed(e.to_string()))
}

fn estimate_prompt(req: &EstimateRequest) -> String {
    let history = if req.past_tasks.is_empty() {
        "(none yet)".to_string()
    } else {
        req.past_tasks
            .iter()
            .map(|past| {
                format!(
                    "- {} ({} minutes)",
                    past.description, past.completion_time_minutes
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    format!(
        "Estimate how many minutes the new task below will take.\n\
         Compare it with the completed tasks from the same person and weigh \
         the most similar ones most heavily. If there are no completed tasks, \
         judge from the description alone.\n\
         \n\
         New task: {}\n\
         \n\
         Completed tasks:\n{history}\n\
         \n\
         Respond with ONLY this JSON:\n\
         {{\"estimatedCompletionTimeMinutes\": <non-negative number>, \"reasoning\": \"<one or two sentences>\"}}",
        req.task_description
    )
}

fn overload_prompt(req: &OverloadRequest) -> String {
    let tasks = req
        .tasks
        .iter()
        .map(|task| format!("- {}: {}", task.due_date.format("%Y-%m-%d"), task.description))
        .collect::<Vec<_>>()
        .join("\n");
    let history = if req.historical_completion_times.is_empty() {
        "none; assume 60 minutes per task".to_string()
    } else {
        req.historical_completion_times
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "These tasks are all due on the same day:\n{tasks}\n\
         \n\
         Past completion times in minutes: {history}\n\
         \n\
         Estimate the total minutes needed to finish all of them and say whether \
         the day looks overloaded. If it does, write a short, friendly warning \
         that mentions the total; otherwise leave the warning empty.\n\
         \n\
         Respond with ONLY this JSON:\n\
         {{\"isOverloaded\": <true|false>, \"estimatedCompletionTime\": <minutes>, \"warningMessage\": \"<text or empty>\"}}"
    )
}

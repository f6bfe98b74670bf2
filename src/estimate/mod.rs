//! The two best-effort estimation calls.
//!
//! [`Estimator`] is the boundary: callers hand over typed requests and get
//! typed, validated responses or an [`EstimationError`]. Two backends exist,
//! a model-backed one ([`LlmEstimator`]) and an offline one
//! ([`HeuristicEstimator`]); [`AnyEstimator`] picks between them at runtime.

mod heuristic;
mod llm;
mod policy;
mod types;

pub use heuristic::HeuristicEstimator;
pub use llm::{DEFAULT_MODEL, LlmEstimator};
pub use policy::OverloadPolicy;
pub use types::{
    EstimateRequest, EstimateResponse, MAX_MINUTES, OverloadRequest, OverloadResponse, PastTask,
    ScheduledTask, validate_minutes,
};

use crate::anthropic::AnthropicClient;
use crate::error::EstimationError;

#[allow(async_fn_in_trait)]
pub trait Estimator {
    /// How long a new task will take, judged from past completions.
    async fn estimate_completion_time(
        &self,
        req: &EstimateRequest,
    ) -> Result<EstimateResponse, EstimationError>;

    /// Whether the tasks due on one day add up to more than fits in it.
    /// An empty `req.tasks` always yields [`OverloadResponse::clear`].
    async fn warn_overloaded_schedule(
        &self,
        req: &OverloadRequest,
    ) -> Result<OverloadResponse, EstimationError>;
}

/// Runtime choice of backend, decided once from configuration.
pub enum AnyEstimator {
    /// Asks the configured model.
    Llm(LlmEstimator<AnthropicClient>),
    /// Works from local history only.
    Heuristic(HeuristicEstimator),
}

impl AnyEstimator {
    /// True when no network call will be made.
    pub fn is_offline(&self) -> bool {
        matches!(self, AnyEstimator::Heuristic(_))
    }
}

impl Estimator for AnyEstimator {
    async fn estimate_completion_time(
        &self,
        req: &EstimateRequest,
    ) -> Result<EstimateResponse, EstimationError> {
        match self {
            AnyEstimator::Llm(inner) => inner.estimate_completion_time(req).await,
            AnyEstimator::Heuristic(inner) => inner.estimate_completion_time(req).await,
        }
    }

    async fn warn_overloaded_schedule(
        &self,
        req: &OverloadRequest,
    ) -> Result<OverloadResponse, EstimationError> {
        match self {
            AnyEstimator::Llm(inner) => inner.warn_overloaded_schedule(req).await,
            AnyEstimator::Heuristic(inner) => inner.warn_overloaded_schedule(req).await,
        }
    }
}

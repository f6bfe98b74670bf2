//! Error type for the Anthropic client.

use thiserror::Error;

/// Failures talking to the Messages endpoint.
///
/// Every variant ends up as "estimation unavailable" for the user; the split
/// only matters for logs.
#[derive(Debug, Error)]
pub enum AnthropicError {
    /// HTTP 429.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// Any other non-success status. `message` is the response body, or the
    /// status reason when the body is empty.
    #[error("API error (status {status}): {message}")]
    Status { status: u16, message: String },

    /// The connect or request timeout elapsed.
    #[error("request timed out")]
    Timeout,

    /// DNS, connection refused, body decoding and the like.
    #[error("network error: {0}")]
    Network(reqwest::Error),
}

impl AnthropicError {
    /// Whether the service itself turned the request away, as opposed to the
    /// request never completing.
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Status { .. })
    }
}

impl From<reqwest::Error> for AnthropicError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else {
            Self::Network(err)
        }
    }
}

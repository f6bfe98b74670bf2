use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use tracing::debug;

use super::MessageSender;
use super::error::AnthropicError;
use super::types::{MessagesRequest, MessagesResponse};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_AFTER_MS: u64 = 1000;

/// Messages API client. One instance is built at startup and reused for
/// every estimation call.
pub struct AnthropicClient {
    http: Client,
    api_key: String,
    endpoint: String,
}

impl AnthropicClient {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, AnthropicError> {
        Self::with_base_url(api_key, API_URL.to_string(), timeout)
    }

    /// Points the client at another endpoint, e.g. a local mock server.
    /// `timeout` bounds the whole request, body included.
    pub fn with_base_url(
        api_key: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self, AnthropicError> {
        let http = Client::builder()
            .user_agent(concat!("clarity/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            http,
            api_key,
            endpoint,
        })
    }
}

impl MessageSender for AnthropicClient {
    async fn send_message(
        &self,
        req: &MessagesRequest,
    ) -> Result<MessagesResponse, AnthropicError> {
        debug!(model = %req.model, endpoint = %self.endpoint, "sending messages request");
        let response = self
            .http
            .post(&self.endpoint)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(req)
            .send()
            .await?;

        let body: MessagesResponse = check_status(response).await?.json().await?;
        debug!(
            id = %body.id,
            input_tokens = body.usage.input_tokens,
            output_tokens = body.usage.output_tokens,
            "messages request completed"
        );
        Ok(body)
    }
}

/// Maps non-2xx replies onto [`AnthropicError`]; passes successes through.
async fn check_status(response: Response) -> Result<Response, AnthropicError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(AnthropicError::RateLimited {
            retry_after_ms: retry_after_ms(response.headers()),
        });
    }
    let message = match response.text().await {
        Ok(text) if !text.trim().is_empty() => text,
        _ => status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string(),
    };
    Err(AnthropicError::Status {
        status: status.as_u16(),
        message,
    })
}

// Only the delay-seconds form of Retry-After is understood.
fn retry_after_ms(headers: &HeaderMap) -> u64 {
    headers
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(DEFAULT_RETRY_AFTER_MS, |secs| secs.saturating_mul(1000))
}

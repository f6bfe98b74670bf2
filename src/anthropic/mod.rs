//! Minimal client for the Anthropic Messages API.
//!
//! The estimators only ever need "send one prompt, get text back", which is
//! what [`MessageSender`] captures. Tests substitute their own sender.

pub mod client;
pub mod error;
pub mod types;

pub use client::AnthropicClient;
pub use error::AnthropicError;
pub use types::{ContentBlock, Message, MessagesRequest, MessagesResponse, Usage};

/// Anything that can deliver a [`MessagesRequest`] and return the model reply.
#[allow(async_fn_in_trait)]
pub trait MessageSender {
    async fn send_message(
        &self,
        req: &MessagesRequest,
    ) -> Result<MessagesResponse, AnthropicError>;
}

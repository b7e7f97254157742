//! Request/response boundary consumed by the core.
//!
//! The console binary implements [`ChatApi`] over HTTP; tests swap in a
//! scripted fake. Selection always reloads history through this path, so
//! dropped channel notifications never leave the view permanently stale.

use crate::types::{Conversation, Message};

/// Errors from the request/response path.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The service could not be reached at all.
    #[error("storefront service is unavailable")]
    Unavailable,

    /// The request reached the service and was rejected.
    #[error("request failed with status {status}: {message}")]
    Status { status: u16, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// The storefront endpoints the chat core depends on.
///
/// Callers hold the implementation by value and never spawn the returned
/// futures, so no `Send` bound is required.
#[allow(async_fn_in_trait)]
pub trait ChatApi {
    /// `GET` the conversation list with its best-effort summaries.
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError>;

    /// `GET` the full message history for one conversation.
    async fn history(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError>;

    /// `POST` an operator-authored message; returns the authoritative copy.
    async fn post_message(
        &self,
        conversation_id: &str,
        content: &str,
    ) -> Result<Message, ApiError>;
}

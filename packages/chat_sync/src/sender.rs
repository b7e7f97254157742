//! Sender
//!
//! Delivers operator-authored content with at-most-one-visible-copy
//! semantics regardless of transport path. The provisional entry lands in
//! the store before any await, so the renderer shows it immediately; the
//! authoritative echo reconciles it later (channel path) or right away
//! (request/response fallback).

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::api::{ApiError, ChatApi};
use crate::client::ClientUpdate;
use crate::connection::ConnectionManager;
use crate::protocol::ClientEvent;
use crate::session::ConversationSession;
use crate::store::MessageStore;

/// Which delivery path a send took.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendPath {
    /// Emitted on the live channel; the echo arrives as `message-delivered`.
    Channel,
    /// Persisted via the request/response call and reconciled from its
    /// return value.
    Fallback,
}

#[derive(Debug, thiserror::Error)]
pub enum SendError {
    /// Rejected before any side effect.
    #[error("message content is empty")]
    EmptyContent,

    /// Rejected before any side effect: sends are scoped to the open
    /// conversation.
    #[error("conversation {0} is not the active selection")]
    NotActive(String),

    /// The fallback call rejected. The provisional entry stays visible,
    /// marked failed; retrying is an explicit operator action.
    #[error("message could not be delivered")]
    DeliveryFailed {
        provisional_id: Uuid,
        #[source]
        source: ApiError,
    },
}

pub async fn send<A: ChatApi>(
    api: &A,
    session: &ConversationSession,
    connection: &ConnectionManager,
    store: &mut MessageStore,
    updates: &mpsc::UnboundedSender<ClientUpdate>,
    conversation_id: &str,
    content: &str,
) -> Result<SendPath, SendError> {
    let content = content.trim();
    if content.is_empty() {
        return Err(SendError::EmptyContent);
    }
    if !session.is_active(conversation_id) {
        return Err(SendError::NotActive(conversation_id.to_string()));
    }

    let provisional_id = store.append_provisional(content);
    let _ = updates.send(ClientUpdate::MessagesChanged);

    if connection.emit(ClientEvent::OperatorMessage {
        conversation_id: conversation_id.to_string(),
        content: content.to_string(),
    }) {
        debug!(%conversation_id, "message emitted on channel");
        return Ok(SendPath::Channel);
    }

    // Channel is down: persist via request/response and reconcile with the
    // returned authoritative message.
    match api.post_message(conversation_id, content).await {
        Ok(message) => {
            if session.is_active(conversation_id) {
                store.merge(&message);
                let _ = updates.send(ClientUpdate::MessagesChanged);
            }
            debug!(%conversation_id, id = %message.id, "message persisted via fallback");
            Ok(SendPath::Fallback)
        }
        Err(err) => {
            warn!(%conversation_id, error = %err, "fallback send failed");
            store.mark_failed(provisional_id);
            let _ = updates.send(ClientUpdate::MessagesChanged);
            Err(SendError::DeliveryFailed {
                provisional_id,
                source: err,
            })
        }
    }
}

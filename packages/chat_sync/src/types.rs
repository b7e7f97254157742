//! Data model shared across the chat synchronization core.
//!
//! Wire shapes (`Conversation`, `Message`) are fixed by the storefront
//! backend and use its camelCase field names; the remaining types are
//! client-side only.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Conversation metadata as served by the storefront backend.
///
/// Conversations are created remotely on first visitor contact and destroyed
/// only remotely; this client treats everything except the derived message
/// count as immutable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    pub id: String,
    pub created_at: DateTime<Utc>,
    /// Opaque tag linking the conversation to the originating visitor session.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Best-effort count shown in the conversation list.
    #[serde(default)]
    pub message_count: Option<u64>,
}

/// An authoritative message: identifier assigned by the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    #[serde(rename = "chatId")]
    pub conversation_id: String,
    pub content: String,
    #[serde(rename = "fromAdmin")]
    pub from_operator: bool,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle of the push channel. Owned exclusively by
/// [`ConnectionManager`](crate::connection::ConnectionManager); every other
/// component only reads it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Live,
}

/// Identity of a store entry.
///
/// Authoritative ids come from the service. Provisional ids are generated
/// locally when a send is issued and never collide within one client
/// lifetime; a provisional entry is replaced, not duplicated, once the
/// authoritative echo for the same send arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageId {
    Assigned(String),
    Provisional(Uuid),
}

/// Delivery state of a store entry; drives the pending/failed markers in
/// the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    Pending,
    Failed,
}

/// One rendered row of the open conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub id: MessageId,
    pub content: String,
    pub from_operator: bool,
    pub created_at: DateTime<Utc>,
    pub delivery: Delivery,
}

impl ChatEntry {
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: MessageId::Assigned(message.id.clone()),
            content: message.content.clone(),
            from_operator: message.from_operator,
            created_at: message.created_at,
            delivery: Delivery::Delivered,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self.id, MessageId::Provisional(_))
    }
}

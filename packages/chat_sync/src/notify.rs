//! Notification Router
//!
//! Converts out-of-band activity signals into list-level refresh without
//! coupling to whichever conversation is open. Signals are best-effort and
//! may be dropped by the transport; the explicit history reload on
//! selection is what keeps the view eventually consistent.

use tracing::warn;

use crate::session::ConversationSession;
use crate::store::MessageStore;
use crate::types::Message;

/// What a routed notification resulted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Routed {
    /// The conversation list summary should be refetched. Always set: the
    /// list is refreshed no matter which conversation saw activity.
    pub list_stale: bool,
    /// The carried message was merged into the open conversation.
    pub merged: bool,
}

pub fn route(
    conversation_id: &str,
    message: Option<&Message>,
    session: &ConversationSession,
    store: &mut MessageStore,
) -> Routed {
    let mut merged = false;
    if session.is_active(conversation_id) {
        if let Some(message) = message {
            if message.conversation_id == conversation_id {
                store.merge(message);
                merged = true;
            } else {
                warn!(
                    notified = %conversation_id,
                    carried = %message.conversation_id,
                    "notification payload targets a different conversation, dropped"
                );
            }
        }
    }
    Routed {
        list_stale: true,
        merged,
    }
}

//! Conversation Session
//!
//! Binds the operator's current selection to the channel subscription and
//! guards against cross-conversation leakage. Selection changes are
//! synchronous; async results minted under an older selection carry a
//! [`SelectToken`] and are discarded once the token has gone stale. This is
//! the cancellation mechanism for in-flight work tied to a conversation the
//! operator has already left.

#[derive(Debug, Default)]
pub struct ConversationSession {
    active: Option<String>,
    epoch: u64,
}

/// Proof of which selection an in-flight operation belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectToken {
    conversation_id: String,
    epoch: u64,
}

impl SelectToken {
    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }
}

impl ConversationSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn is_active(&self, conversation_id: &str) -> bool {
        self.active.as_deref() == Some(conversation_id)
    }

    /// Switch the active selection. Runs before any asynchronous work so
    /// that late arrivals for the previous conversation can be discarded.
    pub fn begin_select(&mut self, conversation_id: &str) -> SelectToken {
        self.epoch += 1;
        self.active = Some(conversation_id.to_string());
        SelectToken {
            conversation_id: conversation_id.to_string(),
            epoch: self.epoch,
        }
    }

    /// Whether a result minted under `token` may still be applied.
    pub fn is_current(&self, token: &SelectToken) -> bool {
        token.epoch == self.epoch && self.is_active(&token.conversation_id)
    }

    /// Clear the selection. No leave signal goes out: reconnecting or
    /// selecting another conversation subsumes it.
    pub fn deselect(&mut self) {
        self.epoch += 1;
        self.active = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_tracks_active_conversation() {
        let mut session = ConversationSession::new();
        assert_eq!(session.active(), None);

        session.begin_select("c-1");
        assert!(session.is_active("c-1"));
        assert!(!session.is_active("c-2"));
    }

    #[test]
    fn token_goes_stale_when_selection_moves_on() {
        let mut session = ConversationSession::new();
        let token_a = session.begin_select("a");
        let token_b = session.begin_select("b");

        // A late history result for "a" must not overwrite "b".
        assert!(!session.is_current(&token_a));
        assert!(session.is_current(&token_b));
    }

    #[test]
    fn reselecting_the_same_conversation_invalidates_older_tokens() {
        let mut session = ConversationSession::new();
        let first = session.begin_select("a");
        let second = session.begin_select("a");

        assert!(!session.is_current(&first));
        assert!(session.is_current(&second));
    }

    #[test]
    fn deselect_invalidates_everything() {
        let mut session = ConversationSession::new();
        let token = session.begin_select("a");
        session.deselect();

        assert_eq!(session.active(), None);
        assert!(!session.is_current(&token));
    }
}

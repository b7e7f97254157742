//! Shared fixtures for the crate's unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::DateTime;
use tokio::sync::mpsc;

use crate::api::{ApiError, ChatApi};
use crate::protocol::ClientEvent;
use crate::transport::{ChannelError, ChannelHandle, ChannelEvent, Connector};
use crate::types::{Conversation, Message};

pub(crate) fn message(
    id: &str,
    conversation_id: &str,
    content: &str,
    from_operator: bool,
    ts: i64,
) -> Message {
    Message {
        id: id.to_string(),
        conversation_id: conversation_id.to_string(),
        content: content.to_string(),
        from_operator,
        created_at: DateTime::from_timestamp(ts, 0).unwrap(),
    }
}

/// Scripted [`ChatApi`] that records calls and replays queued responses.
pub(crate) struct FakeApi {
    inner: Mutex<FakeApiState>,
}

#[derive(Default)]
struct FakeApiState {
    conversations: Vec<Conversation>,
    history: HashMap<String, Vec<Message>>,
    post_results: Vec<Result<Message, ApiError>>,
    posted: Vec<(String, String)>,
}

impl FakeApi {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(FakeApiState::default()),
        }
    }

    pub(crate) fn set_conversations(&self, conversations: Vec<Conversation>) {
        self.inner.lock().unwrap().conversations = conversations;
    }

    pub(crate) fn set_history(&self, conversation_id: &str, messages: Vec<Message>) {
        self.inner
            .lock()
            .unwrap()
            .history
            .insert(conversation_id.to_string(), messages);
    }

    pub(crate) fn push_post_result(&self, result: Result<Message, ApiError>) {
        self.inner.lock().unwrap().post_results.push(result);
    }

    /// Every `(conversation_id, content)` pair posted through the fallback.
    pub(crate) fn posted(&self) -> Vec<(String, String)> {
        self.inner.lock().unwrap().posted.clone()
    }
}

impl ChatApi for FakeApi {
    async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        Ok(self.inner.lock().unwrap().conversations.clone())
    }

    async fn history(&self, conversation_id: &str) -> Result<Vec<Message>, ApiError> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .history
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn post_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError> {
        let mut state = self.inner.lock().unwrap();
        state
            .posted
            .push((conversation_id.to_string(), content.to_string()));
        assert!(
            !state.post_results.is_empty(),
            "unexpected post_message({conversation_id}, {content}) with no scripted result"
        );
        state.post_results.remove(0)
    }
}

/// One accepted connection's view from the far side of the transport.
pub(crate) struct FakeChannel {
    sent: mpsc::UnboundedReceiver<ClientEvent>,
}

impl FakeChannel {
    /// Drain everything the client has written to the channel so far.
    pub(crate) fn sent_events(&mut self) -> Vec<ClientEvent> {
        let mut out = Vec::new();
        while let Ok(event) = self.sent.try_recv() {
            out.push(event);
        }
        out
    }
}

/// [`Connector`] that hands out in-memory channels, one per connect call.
pub(crate) struct FakeConnector {
    fail: bool,
    channels: Arc<Mutex<Vec<FakeChannel>>>,
}

impl FakeConnector {
    pub(crate) fn new() -> Self {
        Self {
            fail: false,
            channels: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            channels: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub(crate) fn channels(&self) -> Arc<Mutex<Vec<FakeChannel>>> {
        Arc::clone(&self.channels)
    }
}

impl Connector for FakeConnector {
    async fn connect(&self) -> Result<ChannelHandle, ChannelError> {
        if self.fail {
            return Err(ChannelError::Unavailable);
        }
        let (outbound, sent) = mpsc::unbounded_channel::<ClientEvent>();
        let (_server_tx, inbound) = mpsc::unbounded_channel::<ChannelEvent>();
        self.channels.lock().unwrap().push(FakeChannel { sent });
        Ok(ChannelHandle { outbound, inbound })
    }
}

//! Chat Client
//!
//! Facade owning the synchronization components. All chat state lives
//! behind one `&mut self`, handlers run to completion before the next one
//! starts, and inbound channel events funnel through a single dispatch
//! point — so store merges are serialized without any locking.

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::api::{ApiError, ChatApi};
use crate::connection::ConnectionManager;
use crate::notify;
use crate::protocol::{ClientEvent, ServerEvent};
use crate::sender::{self, SendError, SendPath};
use crate::session::ConversationSession;
use crate::store::MessageStore;
use crate::transport::{ChannelEvent, Connector};
use crate::types::{ChatEntry, ConnectionState, Conversation};

/// State changes pushed to the embedding UI.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientUpdate {
    /// Push-channel state changed. Connect failures arrive this way too;
    /// they are never thrown at callers.
    Connection(ConnectionState),
    /// The open conversation's message list changed.
    MessagesChanged,
    /// Some conversation saw activity; refetch the list summary.
    ConversationListStale,
    /// The channel reported a non-fatal error.
    ChannelError(String),
}

pub struct ChatClient<A, C> {
    api: A,
    connector: C,
    connection: ConnectionManager,
    session: ConversationSession,
    store: MessageStore,
    updates: mpsc::UnboundedSender<ClientUpdate>,
}

impl<A: ChatApi, C: Connector> ChatClient<A, C> {
    pub fn new(api: A, connector: C) -> (Self, mpsc::UnboundedReceiver<ClientUpdate>) {
        let (updates, updates_rx) = mpsc::unbounded_channel();
        (
            Self {
                api,
                connector,
                connection: ConnectionManager::new(),
                session: ConversationSession::new(),
                store: MessageStore::new(),
                updates,
            },
            updates_rx,
        )
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn is_live(&self) -> bool {
        self.connection.is_live()
    }

    pub fn active_conversation(&self) -> Option<&str> {
        self.session.active()
    }

    /// The ordered message list of the open conversation.
    pub fn messages(&self) -> &[ChatEntry] {
        self.store.entries()
    }

    /// Fetch the conversation list (request/response path; never cached).
    pub async fn conversations(&self) -> Result<Vec<Conversation>, ApiError> {
        self.api.conversations().await
    }

    /// Establish the push channel. Idempotent: a no-op while Connecting or
    /// Live. Transport failure surfaces as a `Connection` update, not an
    /// error. On success the caller receives the inbound event stream to
    /// feed back into [`ChatClient::handle_channel_event`].
    pub async fn connect(&mut self) -> Option<mpsc::UnboundedReceiver<ChannelEvent>> {
        if !self.connection.begin_connect() {
            return None;
        }
        self.push_update(ClientUpdate::Connection(ConnectionState::Connecting));
        match self.connector.connect().await {
            Ok(handle) => {
                self.connection.transport_ready(handle.outbound);
                Some(handle.inbound)
            }
            Err(err) => {
                warn!(error = %err, "push channel connect failed");
                self.connection.connection_lost();
                self.push_update(ClientUpdate::Connection(ConnectionState::Disconnected));
                None
            }
        }
    }

    /// Tear the channel down deliberately.
    pub fn disconnect(&mut self) {
        if self.connection.state() != ConnectionState::Disconnected {
            self.connection.disconnect();
            self.push_update(ClientUpdate::Connection(ConnectionState::Disconnected));
        }
    }

    /// Open a conversation: switch the selection synchronously, reload its
    /// history, then scope the channel to it when live. A history result
    /// that outlives its selection is discarded, never applied.
    pub async fn select(&mut self, conversation_id: &str) -> Result<(), ApiError> {
        let token = self.session.begin_select(conversation_id);
        let history = self.api.history(conversation_id).await;
        if !self.session.is_current(&token) {
            debug!(%conversation_id, "history fetch outlived its selection, discarded");
            return Ok(());
        }
        let messages = history?;
        self.store.replace_all(&messages);
        self.push_update(ClientUpdate::MessagesChanged);
        if self.connection.is_live() {
            self.connection.emit(ClientEvent::JoinConversation {
                conversation_id: conversation_id.to_string(),
            });
        }
        Ok(())
    }

    /// Close the open conversation.
    pub fn deselect(&mut self) {
        self.session.deselect();
        self.store.clear();
        self.push_update(ClientUpdate::MessagesChanged);
    }

    /// Send operator content to the active conversation, optimistically.
    pub async fn send(
        &mut self,
        conversation_id: &str,
        content: &str,
    ) -> Result<SendPath, SendError> {
        sender::send(
            &self.api,
            &self.session,
            &self.connection,
            &mut self.store,
            &self.updates,
            conversation_id,
            content,
        )
        .await
    }

    /// Single dispatch point for everything the transport delivers.
    pub fn handle_channel_event(&mut self, event: ChannelEvent) {
        match event {
            ChannelEvent::Event(event) => self.handle_server_event(event),
            ChannelEvent::Closed => {
                self.connection.connection_lost();
                self.push_update(ClientUpdate::Connection(ConnectionState::Disconnected));
            }
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::IdentifyAck => {
                self.connection.handshake_complete();
                self.push_update(ClientUpdate::Connection(ConnectionState::Live));
                // Re-scope to the open conversation after (re)connecting;
                // the previous subscription died with the old transport.
                if let Some(active) = self.session.active() {
                    let conversation_id = active.to_string();
                    self.connection
                        .emit(ClientEvent::JoinConversation { conversation_id });
                }
            }
            ServerEvent::MessageDelivered { message } => {
                if self.session.is_active(&message.conversation_id) {
                    self.store.merge(&message);
                    self.push_update(ClientUpdate::MessagesChanged);
                } else {
                    debug!(
                        conversation_id = %message.conversation_id,
                        "delivery for a non-active conversation ignored"
                    );
                }
            }
            ServerEvent::ActivityNotification {
                conversation_id,
                message,
            } => {
                let routed = notify::route(
                    &conversation_id,
                    message.as_ref(),
                    &self.session,
                    &mut self.store,
                );
                if routed.merged {
                    self.push_update(ClientUpdate::MessagesChanged);
                }
                if routed.list_stale {
                    self.push_update(ClientUpdate::ConversationListStale);
                }
            }
            ServerEvent::ChannelError { message } => {
                warn!(%message, "channel error reported");
                self.push_update(ClientUpdate::ChannelError(message));
            }
        }
    }

    fn push_update(&self, update: ClientUpdate) {
        let _ = self.updates.send(update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::{FakeApi, FakeChannel, FakeConnector, message};
    use crate::types::{Delivery, MessageId};

    fn drain(
        rx: &mut mpsc::UnboundedReceiver<ClientUpdate>,
    ) -> Vec<ClientUpdate> {
        let mut out = Vec::new();
        while let Ok(update) = rx.try_recv() {
            out.push(update);
        }
        out
    }

    async fn live_client(
        api: FakeApi,
    ) -> (
        ChatClient<FakeApi, FakeConnector>,
        mpsc::UnboundedReceiver<ClientUpdate>,
        FakeChannel,
    ) {
        let connector = FakeConnector::new();
        let channels = connector.channels();
        let (mut client, updates_rx) = ChatClient::new(api, connector);

        let inbound = client.connect().await;
        assert!(inbound.is_some());
        client.handle_channel_event(ChannelEvent::Event(ServerEvent::IdentifyAck));
        assert!(client.is_live());

        let channel = channels.lock().unwrap().remove(0);
        (client, updates_rx, channel)
    }

    #[tokio::test]
    async fn connect_failure_surfaces_as_state_change() {
        let connector = FakeConnector::failing();
        let (mut client, mut updates_rx) = ChatClient::new(FakeApi::new(), connector);

        assert!(client.connect().await.is_none());
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
        assert_eq!(
            drain(&mut updates_rx),
            [
                ClientUpdate::Connection(ConnectionState::Connecting),
                ClientUpdate::Connection(ConnectionState::Disconnected),
            ]
        );
    }

    #[tokio::test]
    async fn connect_is_idempotent_while_live() {
        let (mut client, _updates, _channel) = live_client(FakeApi::new()).await;
        assert!(client.connect().await.is_none());
        assert!(client.is_live());
    }

    #[tokio::test]
    async fn select_loads_history_and_joins_channel() {
        let api = FakeApi::new();
        api.set_history("c-1", vec![message("m-1", "c-1", "hi", false, 10)]);
        let (mut client, _updates, mut channel) = live_client(api).await;

        client.select("c-1").await.unwrap();

        assert_eq!(client.active_conversation(), Some("c-1"));
        assert_eq!(client.messages().len(), 1);
        assert_eq!(
            channel.sent_events(),
            [
                ClientEvent::IdentifyAsOperator,
                ClientEvent::JoinConversation {
                    conversation_id: "c-1".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn send_while_live_then_echo_leaves_one_delivered_entry() {
        let api = FakeApi::new();
        api.set_history("c-1", Vec::new());
        let (mut client, _updates, mut channel) = live_client(api).await;
        client.select("c-1").await.unwrap();

        let path = client.send("c-1", "hello").await.unwrap();
        assert_eq!(path, SendPath::Channel);
        assert_eq!(client.messages().len(), 1);
        assert_eq!(client.messages()[0].delivery, Delivery::Pending);

        client.handle_channel_event(ChannelEvent::Event(ServerEvent::MessageDelivered {
            message: message("m-1", "c-1", "hello", true, 50),
        }));

        assert_eq!(client.messages().len(), 1, "echo reconciled, no duplicate");
        let entry = &client.messages()[0];
        assert_eq!(entry.id, MessageId::Assigned("m-1".to_string()));
        assert_eq!(entry.delivery, Delivery::Delivered);

        // The send itself went over the wire, not the fallback path.
        assert!(channel.sent_events().contains(&ClientEvent::OperatorMessage {
            conversation_id: "c-1".to_string(),
            content: "hello".to_string(),
        }));
    }

    #[tokio::test]
    async fn cross_conversation_notification_refreshes_list_only() {
        let api = FakeApi::new();
        api.set_history("c-1", vec![message("m-1", "c-1", "hi", false, 10)]);
        let (mut client, mut updates_rx, _channel) = live_client(api).await;
        client.select("c-1").await.unwrap();
        let _ = drain(&mut updates_rx);

        client.handle_channel_event(ChannelEvent::Event(ServerEvent::ActivityNotification {
            conversation_id: "c-2".to_string(),
            message: Some(message("m-2", "c-2", "elsewhere", false, 20)),
        }));

        assert_eq!(client.messages().len(), 1, "open conversation unchanged");
        assert_eq!(drain(&mut updates_rx), [ClientUpdate::ConversationListStale]);
    }

    #[tokio::test]
    async fn delivery_for_non_active_conversation_is_ignored() {
        let api = FakeApi::new();
        api.set_history("c-1", Vec::new());
        let (mut client, _updates, _channel) = live_client(api).await;
        client.select("c-1").await.unwrap();

        client.handle_channel_event(ChannelEvent::Event(ServerEvent::MessageDelivered {
            message: message("m-1", "c-2", "stray", false, 20),
        }));

        assert!(client.messages().is_empty());
    }

    #[tokio::test]
    async fn reconnection_switches_send_path_back_to_channel() {
        let api = FakeApi::new();
        api.set_history("c-1", Vec::new());
        api.push_post_result(Ok(message("42", "c-1", "offline ping", true, 30)));
        let (mut client, _updates, _channel) = live_client(api).await;
        client.select("c-1").await.unwrap();

        // Transport drops: next send goes through the fallback call.
        client.handle_channel_event(ChannelEvent::Closed);
        assert!(!client.is_live());
        let path = client.send("c-1", "offline ping").await.unwrap();
        assert_eq!(path, SendPath::Fallback);
        assert_eq!(client.messages().len(), 1);
        assert_eq!(
            client.messages()[0].id,
            MessageId::Assigned("42".to_string())
        );

        // Channel recovers: the live path is used again and the open
        // conversation is re-joined.
        let inbound = client.connect().await;
        assert!(inbound.is_some());
        client.handle_channel_event(ChannelEvent::Event(ServerEvent::IdentifyAck));
        assert!(client.is_live());

        let path = client.send("c-1", "live again").await.unwrap();
        assert_eq!(path, SendPath::Channel);
    }

    #[tokio::test]
    async fn rejoin_after_reconnect_targets_the_open_conversation() {
        let api = FakeApi::new();
        api.set_history("c-1", Vec::new());
        let connector = FakeConnector::new();
        let channels = connector.channels();
        let (mut client, _updates_rx) = ChatClient::new(api, connector);

        client.connect().await.unwrap();
        client.handle_channel_event(ChannelEvent::Event(ServerEvent::IdentifyAck));
        client.select("c-1").await.unwrap();

        client.handle_channel_event(ChannelEvent::Closed);
        client.connect().await.unwrap();
        client.handle_channel_event(ChannelEvent::Event(ServerEvent::IdentifyAck));

        let mut second = channels.lock().unwrap().remove(1);
        assert_eq!(
            second.sent_events(),
            [
                ClientEvent::IdentifyAsOperator,
                ClientEvent::JoinConversation {
                    conversation_id: "c-1".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn channel_error_is_surfaced_without_state_change() {
        let (mut client, mut updates_rx, _channel) = live_client(FakeApi::new()).await;
        let _ = drain(&mut updates_rx);

        client.handle_channel_event(ChannelEvent::Event(ServerEvent::ChannelError {
            message: "subscription rejected".to_string(),
        }));

        assert!(client.is_live());
        assert_eq!(
            drain(&mut updates_rx),
            [ClientUpdate::ChannelError("subscription rejected".to_string())]
        );
    }

    #[tokio::test]
    async fn conversation_list_is_fetched_on_demand() {
        let api = FakeApi::new();
        api.set_conversations(vec![Conversation {
            id: "c-1".to_string(),
            created_at: message("m", "c-1", "", false, 10).created_at,
            session_id: Some("s-1".to_string()),
            message_count: Some(3),
        }]);
        let (client, _updates) = ChatClient::new(api, FakeConnector::new());

        let conversations = client.conversations().await.unwrap();
        assert_eq!(conversations.len(), 1);
        assert_eq!(conversations[0].id, "c-1");
        assert_eq!(conversations[0].message_count, Some(3));
    }

    #[tokio::test]
    async fn deselect_clears_the_store() {
        let api = FakeApi::new();
        api.set_history("c-1", vec![message("m-1", "c-1", "hi", false, 10)]);
        let (mut client, _updates, _channel) = live_client(api).await;
        client.select("c-1").await.unwrap();
        assert_eq!(client.messages().len(), 1);

        client.deselect();

        assert_eq!(client.active_conversation(), None);
        assert!(client.messages().is_empty());
    }
}

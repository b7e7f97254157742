//! Connection Manager
//!
//! Owns the lifecycle of the push channel: exactly one logical connection
//! per operator session. State is mutated here and nowhere else; dependents
//! poll [`ConnectionManager::is_live`] or subscribe to the watch channel
//! rather than catching errors, so a dropped connection degrades behavior
//! instead of aborting in-flight operations.

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::protocol::ClientEvent;
use crate::types::ConnectionState;

pub struct ConnectionManager {
    state: ConnectionState,
    outbound: Option<mpsc::UnboundedSender<ClientEvent>>,
    state_tx: watch::Sender<ConnectionState>,
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionManager {
    pub fn new() -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            state: ConnectionState::Disconnected,
            outbound: None,
            state_tx,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Snapshot read, no side effect.
    pub fn is_live(&self) -> bool {
        self.state == ConnectionState::Live
    }

    /// Subscribe to state-change notifications.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state_tx.subscribe()
    }

    /// Move `Disconnected -> Connecting`. Returns false while already
    /// Connecting or Live, which makes connect idempotent for callers.
    pub(crate) fn begin_connect(&mut self) -> bool {
        if self.state != ConnectionState::Disconnected {
            return false;
        }
        self.set_state(ConnectionState::Connecting);
        true
    }

    /// The transport is up: take ownership of the outbound handle and start
    /// the operator-identification handshake.
    pub(crate) fn transport_ready(&mut self, outbound: mpsc::UnboundedSender<ClientEvent>) {
        let _ = outbound.send(ClientEvent::IdentifyAsOperator);
        self.outbound = Some(outbound);
    }

    /// `identify-ack` received: the channel is live.
    pub(crate) fn handshake_complete(&mut self) {
        if self.state == ConnectionState::Live {
            return;
        }
        info!("push channel live");
        self.set_state(ConnectionState::Live);
    }

    /// The transport dropped or failed. Active subscriptions die with the
    /// connection; the service treats an abrupt disconnect as implicit
    /// unsubscribe, so nothing is sent.
    pub(crate) fn connection_lost(&mut self) {
        self.outbound = None;
        if self.state != ConnectionState::Disconnected {
            warn!("push channel lost");
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Deliberate teardown. Dropping the outbound handle ends the
    /// transport's writer task, which closes the socket.
    pub fn disconnect(&mut self) {
        self.outbound = None;
        if self.state != ConnectionState::Disconnected {
            info!("push channel closed");
            self.set_state(ConnectionState::Disconnected);
        }
    }

    /// Emit a scoped event on the live channel. Returns false when the
    /// channel is not live; callers fall back to request/response.
    pub(crate) fn emit(&self, event: ClientEvent) -> bool {
        if self.state != ConnectionState::Live {
            return false;
        }
        match &self.outbound {
            Some(tx) => tx.send(event).is_ok(),
            None => false,
        }
    }

    fn set_state(&mut self, next: ConnectionState) {
        debug!(from = ?self.state, to = ?next, "connection state change");
        self.state = next;
        let _ = self.state_tx.send(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    #[test]
    fn begin_connect_is_idempotent() {
        let mut conn = ConnectionManager::new();
        assert!(conn.begin_connect());
        assert!(!conn.begin_connect(), "second connect while Connecting");

        let (tx, _rx) = mpsc::unbounded_channel();
        conn.transport_ready(tx);
        conn.handshake_complete();
        assert!(!conn.begin_connect(), "connect while Live");
    }

    #[test]
    fn handshake_sequence_reaches_live() {
        let mut conn = ConnectionManager::new();
        conn.begin_connect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        conn.transport_ready(tx);

        // Identification is the first thing on the wire.
        assert_eq!(rx.try_recv().unwrap(), ClientEvent::IdentifyAsOperator);
        assert!(!conn.is_live());

        conn.handshake_complete();
        assert!(conn.is_live());
    }

    #[test]
    fn emit_requires_live_state() {
        let mut conn = ConnectionManager::new();
        let event = ClientEvent::JoinConversation {
            conversation_id: "c-1".to_string(),
        };
        assert!(!conn.emit(event.clone()));

        conn.begin_connect();
        let (tx, mut rx) = mpsc::unbounded_channel();
        conn.transport_ready(tx);
        assert!(!conn.emit(event.clone()), "Connecting is not Live");

        conn.handshake_complete();
        assert!(conn.emit(event.clone()));
        let _ = rx.try_recv(); // identify-as-operator
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn connection_lost_drops_outbound_and_notifies() {
        let mut conn = ConnectionManager::new();
        let mut states = conn.subscribe();
        conn.begin_connect();
        let (tx, _rx) = mpsc::unbounded_channel();
        conn.transport_ready(tx);
        conn.handshake_complete();

        conn.connection_lost();
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(!conn.emit(ClientEvent::IdentifyAsOperator));
        assert_eq!(*states.borrow_and_update(), ConnectionState::Disconnected);
    }
}

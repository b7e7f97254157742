//! # Chat Sync
//!
//! Synchronization core for the shopdesk operator chat panel. It keeps the
//! operator's view of a conversation consistent across three independent
//! message sources — a paginated history fetch, locally-issued optimistic
//! sends, and asynchronously pushed channel events — while the push channel
//! may drop and recover at any time.
//!
//! ## Components
//!
//! ```text
//! ChatClient
//! ├── ConnectionManager    lifecycle of the push channel (connect,
//! │                        identify handshake, live/dead state)
//! ├── ConversationSession  active selection + stale-result discarding
//! ├── MessageStore         ordered, de-duplicated message list for the
//! │                        open conversation
//! ├── sender               optimistic send with channel/fallback routing
//! └── notify               out-of-band activity routing (list refresh)
//! ```
//!
//! The remote service is reached two ways: the persistent WebSocket channel
//! (`transport::WsConnector`) for pushes, and the request/response endpoints
//! behind the [`ChatApi`] trait for history, the conversation list, and the
//! degraded-mode send path. Both seams are traits so tests drive the core
//! without any network.
//!
//! All state is owned by a single `ChatClient` and every handler is a plain
//! `&mut self` method that runs to completion, so merge operations on the
//! store are naturally serialized without locks.

pub mod api;
pub mod client;
pub mod connection;
pub mod notify;
pub mod protocol;
pub mod sender;
pub mod session;
pub mod store;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod test_util;

pub use api::{ApiError, ChatApi};
pub use client::{ChatClient, ClientUpdate};
pub use connection::ConnectionManager;
pub use protocol::{ClientEvent, ServerEvent};
pub use sender::{SendError, SendPath};
pub use session::{ConversationSession, SelectToken};
pub use store::MessageStore;
pub use transport::{ChannelError, ChannelEvent, ChannelHandle, Connector, WsConnector};
pub use types::{ChatEntry, ConnectionState, Conversation, Delivery, Message, MessageId};

//! Channel event vocabulary.
//!
//! Event names and payload shapes are fixed by the storefront backend.
//! Frames are adjacently tagged (`{"event": "...", "data": {...}}`) and
//! dispatched by matching on the decoded enum, one handler per variant.

use serde::{Deserialize, Serialize};

use crate::types::Message;

/// Events sent FROM the operator console TO the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientEvent {
    /// Operator-identification handshake, sent once per connection right
    /// after the transport comes up. No payload; the token authorizing it
    /// travels at the transport level.
    IdentifyAsOperator,
    /// Scope subsequent pushes to one conversation for this client.
    #[serde(rename_all = "camelCase")]
    JoinConversation { conversation_id: String },
    /// Ask the service to persist and broadcast a new operator message.
    #[serde(rename_all = "camelCase")]
    OperatorMessage {
        conversation_id: String,
        content: String,
    },
}

/// Events pushed FROM the service TO the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerEvent {
    /// Operator identification confirmed; the channel is live.
    IdentifyAck,
    /// Activity happened in some conversation, not necessarily the open
    /// one. Best-effort: the transport may drop these.
    #[serde(rename_all = "camelCase")]
    ActivityNotification {
        conversation_id: String,
        #[serde(default)]
        message: Option<Message>,
    },
    /// A message was persisted and broadcast on the joined conversation.
    MessageDelivered { message: Message },
    /// Non-fatal channel-level error report.
    ChannelError { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn client_events_use_contract_names() {
        let identify = serde_json::to_value(&ClientEvent::IdentifyAsOperator).unwrap();
        assert_eq!(identify, json!({ "event": "identify-as-operator" }));

        let join = serde_json::to_value(&ClientEvent::JoinConversation {
            conversation_id: "c-1".to_string(),
        })
        .unwrap();
        assert_eq!(
            join,
            json!({ "event": "join-conversation", "data": { "conversationId": "c-1" } })
        );

        let send = serde_json::to_value(&ClientEvent::OperatorMessage {
            conversation_id: "c-1".to_string(),
            content: "hello".to_string(),
        })
        .unwrap();
        assert_eq!(
            send,
            json!({
                "event": "operator-message",
                "data": { "conversationId": "c-1", "content": "hello" }
            })
        );
    }

    #[test]
    fn server_events_decode_from_contract_frames() {
        let ack: ServerEvent = serde_json::from_value(json!({ "event": "identify-ack" })).unwrap();
        assert_eq!(ack, ServerEvent::IdentifyAck);

        let delivered: ServerEvent = serde_json::from_value(json!({
            "event": "message-delivered",
            "data": { "message": {
                "id": "m-1",
                "chatId": "c-1",
                "content": "hi",
                "fromAdmin": false,
                "createdAt": "2025-04-01T10:00:00Z"
            }}
        }))
        .unwrap();
        match delivered {
            ServerEvent::MessageDelivered { message } => {
                assert_eq!(message.id, "m-1");
                assert_eq!(message.conversation_id, "c-1");
                assert!(!message.from_operator);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        // Notification without a carried message is valid.
        let bare: ServerEvent = serde_json::from_value(json!({
            "event": "activity-notification",
            "data": { "conversationId": "c-2" }
        }))
        .unwrap();
        assert_eq!(
            bare,
            ServerEvent::ActivityNotification {
                conversation_id: "c-2".to_string(),
                message: None,
            }
        );
    }
}

//! Realtime message types

use serde::{Deserialize, Serialize};

use crate::records::{ChangeEvent, ChangeKind, Table};

/// Subscribes to both tables
pub const ALL_TOPICS: &str = "*";

/// Messages sent from client to server
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Topics are table names (`carros`, `leads`) or `*`
    Subscribe { topics: Vec<String> },
    Unsubscribe { topics: Vec<String> },
    Ping,
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connected { connection_id: String },
    Subscribed { topics: Vec<String> },
    Unsubscribed { topics: Vec<String> },
    /// A row changed; clients reload the affected page
    Change {
        table: Table,
        event: ChangeKind,
        id: i64,
    },
    Pong,
    Error { message: String },
}

/// A message routed to the subscribers of one topic
#[derive(Debug, Clone)]
pub struct WsEvent {
    pub topic: String,
    pub message: ServerMessage,
}

impl From<ChangeEvent> for WsEvent {
    fn from(change: ChangeEvent) -> Self {
        Self {
            topic: change.table.as_str().to_string(),
            message: ServerMessage::Change {
                table: change.table,
                event: change.kind,
                id: change.id,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_message() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "subscribe", "topics": ["carros", "leads"]}"#)
                .unwrap();
        match msg {
            ClientMessage::Subscribe { topics } => assert_eq!(topics, vec!["carros", "leads"]),
            other => panic!("Expected Subscribe, got {:?}", other),
        }

        let ping: ClientMessage = serde_json::from_str(r#"{"type": "ping"}"#).unwrap();
        assert!(matches!(ping, ClientMessage::Ping));
    }

    #[test]
    fn test_change_event_routing() {
        let event = WsEvent::from(ChangeEvent::new(Table::Leads, ChangeKind::Update, 9));
        assert_eq!(event.topic, "leads");

        let json = serde_json::to_value(&event.message).unwrap();
        assert_eq!(json["type"], "change");
        assert_eq!(json["table"], "leads");
        assert_eq!(json["id"], 9);
    }
}

//! Websocket connection hub
//!
//! Tracks live connections and their table subscriptions and routes change
//! messages to subscribers.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use super::messages::{ServerMessage, WsEvent, ALL_TOPICS};
use crate::records::Table;

pub type ConnectionId = String;

#[derive(Debug, Clone)]
pub struct HubConfig {
    /// Registrations past this count are refused
    pub max_connections: usize,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            max_connections: 256,
        }
    }
}

struct Connection {
    sender: mpsc::UnboundedSender<ServerMessage>,
    topics: HashSet<String>,
}

/// Live websocket connections. Cheap to clone.
#[derive(Clone)]
pub struct ConnectionHub {
    connections: Arc<RwLock<HashMap<ConnectionId, Connection>>>,
    /// Topic -> subscribed connections
    subscriptions: Arc<RwLock<HashMap<String, HashSet<ConnectionId>>>>,
    config: HubConfig,
}

impl ConnectionHub {
    /// Empty hub
    pub fn new(config: HubConfig) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            config,
        }
    }

    pub async fn register(
        &self,
        sender: mpsc::UnboundedSender<ServerMessage>,
    ) -> Result<ConnectionId, HubError> {
        let mut connections = self.connections.write().await;
        if connections.len() >= self.config.max_connections {
            return Err(HubError::TooManyConnections {
                limit: self.config.max_connections,
            });
        }

        let id = Uuid::new_v4().to_string();
        connections.insert(
            id.clone(),
            Connection {
                sender,
                topics: HashSet::new(),
            },
        );

        tracing::info!(connection_id = %id, "Realtime client connected");
        Ok(id)
    }

    /// Drop a connection and all of its subscriptions
    pub async fn unregister(&self, id: &str) {
        let Some(connection) = self.connections.write().await.remove(id) else {
            return;
        };

        let mut subs = self.subscriptions.write().await;
        for topic in connection.topics {
            if let Some(ids) = subs.get_mut(&topic) {
                ids.remove(id);
                if ids.is_empty() {
                    subs.remove(&topic);
                }
            }
        }

        tracing::info!(connection_id = %id, "Realtime client disconnected");
    }

    /// Subscribe to topics. Unknown topics are skipped; the accepted ones
    /// are returned.
    pub async fn subscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;
        let mut subs = self.subscriptions.write().await;

        let mut accepted = Vec::new();
        for topic in topics {
            let topic = topic.trim().to_lowercase();
            if !is_valid_topic(&topic) {
                tracing::debug!(connection_id = %id, topic = %topic, "Unknown topic ignored");
                continue;
            }
            connection.topics.insert(topic.clone());
            subs.entry(topic.clone()).or_default().insert(id.to_string());
            accepted.push(topic);
        }

        tracing::debug!(connection_id = %id, topics = ?accepted, "Subscribed");
        Ok(accepted)
    }

    /// Returns the topics that were actually dropped
    pub async fn unsubscribe(&self, id: &str, topics: Vec<String>) -> Result<Vec<String>, HubError> {
        let mut connections = self.connections.write().await;
        let connection = connections.get_mut(id).ok_or(HubError::ConnectionNotFound)?;
        let mut subs = self.subscriptions.write().await;

        let mut removed = Vec::new();
        for topic in topics {
            let topic = topic.trim().to_lowercase();
            if !connection.topics.remove(&topic) {
                continue;
            }
            if let Some(ids) = subs.get_mut(&topic) {
                ids.remove(id);
                if ids.is_empty() {
                    subs.remove(&topic);
                }
            }
            removed.push(topic);
        }

        Ok(removed)
    }

    /// Deliver to subscribers of the event's topic and of `*`. Returns the
    /// number of connections reached.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let subs = self.subscriptions.read().await;
        let connections = self.connections.read().await;

        let empty = HashSet::new();
        let direct = subs.get(&event.topic).unwrap_or(&empty);
        let wildcard = subs.get(ALL_TOPICS).unwrap_or(&empty);

        let mut delivered = 0;
        for id in direct.union(wildcard) {
            if let Some(connection) = connections.get(id) {
                if connection.sender.send(event.message.clone()).is_ok() {
                    delivered += 1;
                }
            }
        }

        tracing::trace!(topic = %event.topic, delivered, "Broadcast");
        delivered
    }

    /// Send to one connection, e.g. a subscription ack
    pub async fn send_to(&self, id: &str, message: ServerMessage) -> Result<(), HubError> {
        let connections = self.connections.read().await;
        let connection = connections.get(id).ok_or(HubError::ConnectionNotFound)?;
        connection
            .sender
            .send(message)
            .map_err(|_| HubError::SendFailed)
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    pub async fn subscription_count(&self, topic: &str) -> usize {
        self.subscriptions
            .read()
            .await
            .get(topic)
            .map(HashSet::len)
            .unwrap_or(0)
    }
}

fn is_valid_topic(topic: &str) -> bool {
    topic == ALL_TOPICS || topic.parse::<Table>().is_ok_and(|t| t.as_str() == topic)
}

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Too many realtime connections (limit: {limit})")]
    TooManyConnections { limit: usize },

    #[error("Connection not found")]
    ConnectionNotFound,

    #[error("Failed to send message")]
    SendFailed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{ChangeEvent, ChangeKind};

    fn change(table: Table) -> WsEvent {
        WsEvent::from(ChangeEvent::new(table, ChangeKind::Insert, 1))
    }

    #[test]
    fn test_valid_topics() {
        assert!(is_valid_topic("carros"));
        assert!(is_valid_topic("leads"));
        assert!(is_valid_topic("*"));
        assert!(!is_valid_topic("cars"));
        assert!(!is_valid_topic("metrics.mood"));
        assert!(!is_valid_topic(""));
    }

    #[tokio::test]
    async fn test_register_unregister() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();

        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["carros".to_string()]).await.unwrap();
        assert_eq!(hub.connection_count().await, 1);

        hub.unregister(&id).await;
        assert_eq!(hub.connection_count().await, 0);
        assert_eq!(hub.subscription_count("carros").await, 0);
    }

    #[tokio::test]
    async fn test_subscribe_filters_unknown_topics() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        let accepted = hub
            .subscribe(&id, vec!["Leads".to_string(), "estoque".to_string()])
            .await
            .unwrap();
        assert_eq!(accepted, vec!["leads"]);

        let removed = hub
            .unsubscribe(&id, vec!["leads".to_string(), "carros".to_string()])
            .await
            .unwrap();
        assert_eq!(removed, vec!["leads"]);
    }

    #[tokio::test]
    async fn test_connection_limit() {
        let hub = ConnectionHub::new(HubConfig { max_connections: 1 });
        let (tx1, _) = mpsc::unbounded_channel();
        let (tx2, _) = mpsc::unbounded_channel();

        hub.register(tx1).await.unwrap();
        assert!(matches!(
            hub.register(tx2).await,
            Err(HubError::TooManyConnections { limit: 1 })
        ));
    }

    #[tokio::test]
    async fn test_broadcast_by_table_and_wildcard() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx_cars, mut rx_cars) = mpsc::unbounded_channel();
        let (tx_all, mut rx_all) = mpsc::unbounded_channel();

        let cars = hub.register(tx_cars).await.unwrap();
        let all = hub.register(tx_all).await.unwrap();
        hub.subscribe(&cars, vec!["carros".to_string()]).await.unwrap();
        hub.subscribe(&all, vec!["*".to_string()]).await.unwrap();

        assert_eq!(hub.broadcast(&change(Table::Leads)).await, 1);
        assert!(rx_cars.try_recv().is_err());
        assert!(rx_all.try_recv().is_ok());

        assert_eq!(hub.broadcast(&change(Table::Cars)).await, 2);
        assert!(matches!(
            rx_cars.try_recv(),
            Ok(ServerMessage::Change { table: Table::Cars, .. })
        ));
    }
}

//! Relays record-store changes to websocket subscribers

use crate::records::{ChangeFeed, ChangeListener, Table};

use super::hub::ConnectionHub;
use super::messages::WsEvent;

/// One change listener per table, forwarding into the hub. Relaying stops
/// when the bridge is dropped.
pub struct RealtimeBridge {
    listeners: Vec<ChangeListener>,
}

impl RealtimeBridge {
    pub fn start(feed: &ChangeFeed, hub: ConnectionHub) -> Self {
        let listeners = [Table::Cars, Table::Leads]
            .into_iter()
            .map(|table| {
                let hub = hub.clone();
                ChangeListener::register(feed, table, move |change| {
                    let hub = hub.clone();
                    async move {
                        hub.broadcast(&WsEvent::from(change)).await;
                    }
                })
            })
            .collect();

        tracing::info!("Realtime bridge started");
        Self { listeners }
    }

    pub fn tables(&self) -> Vec<Table> {
        self.listeners.iter().map(ChangeListener::table).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::{HubConfig, ServerMessage};
    use crate::records::store::tests::{sample_lead, sample_record};
    use crate::records::{ChangeKind, RecordStore};
    use std::time::Duration;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_store_writes_reach_subscribers() {
        let records = RecordStore::open_in_memory().unwrap();
        let hub = ConnectionHub::new(HubConfig::default());
        let bridge = RealtimeBridge::start(records.changes(), hub.clone());
        assert_eq!(bridge.tables(), vec![Table::Cars, Table::Leads]);

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["carros".to_string()]).await.unwrap();

        let car = records.insert_car(&sample_record("Argo", "Fiat")).unwrap();
        records.insert_lead(&sample_lead("Davi", "Argo", "4")).unwrap();

        let msg = tokio::time::timeout(Duration::from_secs(1), rx.recv())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(
            msg,
            ServerMessage::Change {
                table: Table::Cars,
                event: ChangeKind::Insert,
                id: car.id
            }
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_dropped_bridge_stops_relaying() {
        let records = RecordStore::open_in_memory().unwrap();
        let hub = ConnectionHub::new(HubConfig::default());
        let bridge = RealtimeBridge::start(records.changes(), hub.clone());

        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();
        hub.subscribe(&id, vec!["*".to_string()]).await.unwrap();

        drop(bridge);
        tokio::time::sleep(Duration::from_millis(20)).await;
        records.insert_car(&sample_record("Kwid", "Renault")).unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(rx.try_recv().is_err());
    }
}

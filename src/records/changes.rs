//! Change notifications
//!
//! Every committed write on the record store is published on a tokio
//! broadcast channel. Consumers either hold a raw receiver (the realtime
//! bridge) or register a [`ChangeListener`] that runs a callback for every
//! event on one table until it is dropped.

use serde::Serialize;
use std::future::Future;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::types::Table;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// A committed row change
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub id: i64,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, id: i64) -> Self {
        Self { table, kind, id }
    }
}

/// Broadcast channel for row changes
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Publish an event. Having no listeners is not an error.
    pub fn publish(&self, event: ChangeEvent) {
        let receivers = self.tx.send(event).unwrap_or(0);
        tracing::trace!(
            table = %event.table,
            kind = ?event.kind,
            id = event.id,
            receivers,
            "Published change"
        );
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Observer registered on one table's changes.
///
/// The callback runs once per event, in order, with no debouncing. Dropping
/// the listener (or calling [`ChangeListener::unsubscribe`]) deregisters it.
pub struct ChangeListener {
    table: Table,
    handle: JoinHandle<()>,
}

impl ChangeListener {
    /// Register `on_change` for events on `table`. Must be called from
    /// within a tokio runtime.
    pub fn register<F, Fut>(feed: &ChangeFeed, table: Table, on_change: F) -> Self
    where
        F: Fn(ChangeEvent) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut rx = feed.subscribe();

        let handle = tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(event) if event.table == table => on_change(event).await,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(table = %table, skipped, "Change listener lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        tracing::debug!(table = %table, "Change listener registered");
        Self { table, handle }
    }

    pub fn table(&self) -> Table {
        self.table
    }

    /// Deregister the listener
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for ChangeListener {
    fn drop(&mut self) {
        self.handle.abort();
        tracing::debug!(table = %self.table, "Change listener removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(50)).await;
    }

    #[tokio::test]
    async fn test_listener_sees_only_its_table() {
        let feed = ChangeFeed::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let _listener = ChangeListener::register(&feed, Table::Leads, move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        feed.publish(ChangeEvent::new(Table::Leads, ChangeKind::Insert, 1));
        feed.publish(ChangeEvent::new(Table::Cars, ChangeKind::Insert, 1));
        feed.publish(ChangeEvent::new(Table::Leads, ChangeKind::Update, 1));
        settle().await;

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unsubscribe_stops_callbacks() {
        let feed = ChangeFeed::default();
        let calls = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&calls);
        let listener = ChangeListener::register(&feed, Table::Cars, move |_| {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });
        assert_eq!(feed.listener_count(), 1);

        listener.unsubscribe();
        settle().await;
        assert_eq!(feed.listener_count(), 0);

        feed.publish(ChangeEvent::new(Table::Cars, ChangeKind::Delete, 3));
        settle().await;
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}

//! Agent Sync
//!
//! Tells the external sales agent about stock changes. The back-office
//! calls a [`SyncNotifier`] after every car save; failures never block the
//! save.
//!
//! - **WebhookForwarder**: the Sync Function itself, posting to the
//!   configured webhook (`WEBHOOK_AGENT_URL`)
//! - **SyncFunctionClient**: calls a remotely deployed Sync Function

mod client;
mod payload;
mod webhook;

pub use client::SyncFunctionClient;
pub use payload::{CarSnapshot, SyncAction, SyncPayload, SyncReply, STOCK_UPDATE};
pub use webhook::WebhookForwarder;

use async_trait::async_trait;
use thiserror::Error;

/// Receives stock updates after a car is saved
#[async_trait]
pub trait SyncNotifier: Send + Sync {
    async fn notify(&self, payload: &SyncPayload) -> Result<SyncReply, SyncError>;
}

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Sync request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Sync Function returned HTTP {status}")]
    Status { status: u16 },

    #[error("Invalid sync payload: {0}")]
    Payload(#[from] serde_json::Error),
}

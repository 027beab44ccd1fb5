//! Sync Function: forwards stock updates to the agent webhook
//!
//! Every outcome is a [`SyncReply`]; nothing here is allowed to fail the
//! caller's save, so errors are folded into `success: false` replies.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::{SyncError, SyncNotifier, SyncPayload, SyncReply};
use crate::config::SyncConfig;
use crate::notices;

/// Posts payloads to the agent webhook
#[derive(Debug, Clone)]
pub struct WebhookForwarder {
    client: Client,
    webhook_url: Option<String>,
}

impl WebhookForwarder {
    pub fn new(webhook_url: Option<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            webhook_url: webhook_url.filter(|u| !u.trim().is_empty()),
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self, SyncError> {
        Self::new(
            config.webhook_url.clone(),
            Duration::from_millis(config.timeout_ms),
        )
    }

    pub fn is_configured(&self) -> bool {
        self.webhook_url.is_some()
    }

    /// Handle a raw request body as received by the Sync Function
    pub async fn forward_raw(&self, body: &[u8]) -> SyncReply {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::error!("WEBHOOK_AGENT_URL not configured");
            return SyncReply::refused(notices::WEBHOOK_NOT_CONFIGURED);
        };

        let payload: Value = match serde_json::from_slice(body) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::error!(error = %e, "Malformed sync payload");
                return SyncReply::failed(e.to_string());
            }
        };

        self.post(url, &payload).await
    }

    /// Forward an already-typed payload
    pub async fn forward(&self, payload: &SyncPayload) -> SyncReply {
        let Some(url) = self.webhook_url.as_deref() else {
            tracing::error!("WEBHOOK_AGENT_URL not configured");
            return SyncReply::refused(notices::WEBHOOK_NOT_CONFIGURED);
        };

        match serde_json::to_value(payload) {
            Ok(value) => self.post(url, &value).await,
            Err(e) => SyncReply::failed(e.to_string()),
        }
    }

    async fn post(&self, url: &str, payload: &Value) -> SyncReply {
        let tipo = payload.get("tipo").and_then(Value::as_str).unwrap_or_default();
        let acao = payload.get("acao").and_then(Value::as_str).unwrap_or_default();
        tracing::info!(tipo = %tipo, acao = %acao, "Forwarding stock update to agent");

        let response = match self.client.post(url).json(payload).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(error = %e, "Agent webhook unreachable");
                return SyncReply::failed(e.to_string());
            }
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %body, "Agent webhook rejected update");
            return SyncReply::refused(notices::WEBHOOK_FAILED);
        }

        match response.json::<Value>().await {
            Ok(data) => {
                tracing::info!(status = status.as_u16(), "Agent acknowledged update");
                SyncReply::synced(notices::WEBHOOK_SYNCED, data)
            }
            Err(e) => {
                tracing::error!(error = %e, "Agent webhook reply is not JSON");
                SyncReply::failed(e.to_string())
            }
        }
    }
}

#[async_trait]
impl SyncNotifier for WebhookForwarder {
    async fn notify(&self, payload: &SyncPayload) -> Result<SyncReply, SyncError> {
        Ok(self.forward(payload).await)
    }
}

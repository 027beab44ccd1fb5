//! Client for a remotely deployed Sync Function

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

use super::{SyncError, SyncNotifier, SyncPayload, SyncReply};

/// Calls `POST <function_url>` and decodes the reply
#[derive(Debug, Clone)]
pub struct SyncFunctionClient {
    client: Client,
    function_url: String,
}

impl SyncFunctionClient {
    pub fn new(function_url: impl Into<String>, timeout: Duration) -> Result<Self, SyncError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            function_url: function_url.into(),
        })
    }

    pub fn function_url(&self) -> &str {
        &self.function_url
    }
}

#[async_trait]
impl SyncNotifier for SyncFunctionClient {
    async fn notify(&self, payload: &SyncPayload) -> Result<SyncReply, SyncError> {
        let response = self
            .client
            .post(&self.function_url)
            .json(payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
            });
        }

        let reply: SyncReply = response.json().await?;
        tracing::debug!(success = reply.success, "Sync Function replied");
        Ok(reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::{Car, CarStatus};
    use crate::sync::SyncAction;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use chrono::Utc;
    use serde_json::{json, Value};

    async fn spawn_function() -> String {
        let app = Router::new()
            .route(
                "/functions/v1/sync-agent",
                post(|Json(body): Json<Value>| async move {
                    Json(json!({
                        "success": true,
                        "message": "Sincronizado com sucesso",
                        "data": {"echo": body["carro"]["id"]}
                    }))
                }),
            )
            .route(
                "/broken",
                post(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn payload() -> SyncPayload {
        let car = Car {
            id: 42,
            name: "HB20".to_string(),
            brand: "Hyundai".to_string(),
            vehicle_type: "hatch".to_string(),
            transmission: "manual".to_string(),
            year: 2021,
            price: 64900.0,
            status: CarStatus::Sold,
            photos: vec![],
            interior_photos: vec![],
            visits: 0,
            inquiries: 0,
            updated_at: Utc::now(),
        };
        SyncPayload::stock_update(SyncAction::Created, &car)
    }

    #[tokio::test]
    async fn test_notify_decodes_reply() {
        let base = spawn_function().await;
        let client = SyncFunctionClient::new(
            format!("{}/functions/v1/sync-agent", base),
            Duration::from_secs(5),
        )
        .unwrap();

        let reply = client.notify(&payload()).await.unwrap();
        assert!(reply.success);
        assert_eq!(reply.data, Some(json!({"echo": 42})));
    }

    #[tokio::test]
    async fn test_notify_http_error() {
        let base = spawn_function().await;
        let client =
            SyncFunctionClient::new(format!("{}/broken", base), Duration::from_secs(5)).unwrap();

        let err = client.notify(&payload()).await.unwrap_err();
        assert!(matches!(err, SyncError::Status { status: 500 }));
    }
}

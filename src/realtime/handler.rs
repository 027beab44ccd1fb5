//! Websocket upgrade and connection loop

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::hub::ConnectionHub;
use super::messages::{ClientMessage, ServerMessage};
use crate::api::AppState;
use crate::auth::RequireSession;

#[derive(Debug, Default, Deserialize)]
pub struct ConnectParams {
    /// Comma-separated topics to subscribe to on connect
    #[serde(default)]
    pub topics: Option<String>,
}

/// `GET /api/v1/ws`
pub async fn websocket_handler(
    RequireSession(session): RequireSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ConnectParams>,
    ws: WebSocketUpgrade,
) -> Response {
    let hub = state.ws_hub.clone();
    let initial: Vec<String> = params
        .topics
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();

    tracing::debug!(email = %session.email, topics = ?initial, "Realtime upgrade");
    ws.on_upgrade(move |socket| handle_socket(socket, hub, initial))
}

fn encode(message: &ServerMessage) -> Option<Message> {
    match serde_json::to_string(message) {
        Ok(text) => Some(Message::Text(text)),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode realtime message");
            None
        }
    }
}

async fn handle_socket(socket: WebSocket, hub: ConnectionHub, initial: Vec<String>) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();

    let connection_id = match hub.register(tx).await {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!(error = %e, "Realtime connection refused");
            let refusal = ServerMessage::Error {
                message: e.to_string(),
            };
            if let Some(msg) = encode(&refusal) {
                let _ = sink.send(msg).await;
            }
            return;
        }
    };

    let _ = hub
        .send_to(
            &connection_id,
            ServerMessage::Connected {
                connection_id: connection_id.clone(),
            },
        )
        .await;

    if !initial.is_empty() {
        handle_client_message(&hub, &connection_id, ClientMessage::Subscribe { topics: initial }).await;
    }

    let send_id = connection_id.clone();
    let mut send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            let Some(frame) = encode(&message) else {
                continue;
            };
            if sink.send(frame).await.is_err() {
                tracing::debug!(connection_id = %send_id, "Realtime send failed");
                break;
            }
        }
    });

    let recv_hub = hub.clone();
    let recv_id = connection_id.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(message) => handle_client_message(&recv_hub, &recv_id, message).await,
                    Err(e) => {
                        let _ = recv_hub
                            .send_to(
                                &recv_id,
                                ServerMessage::Error {
                                    message: format!("Invalid message format: {}", e),
                                },
                            )
                            .await;
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(connection_id = %recv_id, error = %e, "Realtime receive error");
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    hub.unregister(&connection_id).await;
}

async fn handle_client_message(hub: &ConnectionHub, id: &str, message: ClientMessage) {
    let reply = match message {
        ClientMessage::Subscribe { topics } => hub
            .subscribe(id, topics)
            .await
            .map(|topics| ServerMessage::Subscribed { topics }),
        ClientMessage::Unsubscribe { topics } => hub
            .unsubscribe(id, topics)
            .await
            .map(|topics| ServerMessage::Unsubscribed { topics }),
        ClientMessage::Ping => Ok(ServerMessage::Pong),
    };

    let reply = reply.unwrap_or_else(|e| ServerMessage::Error {
        message: e.to_string(),
    });
    let _ = hub.send_to(id, reply).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::realtime::HubConfig;

    #[tokio::test]
    async fn test_client_messages_get_replies() {
        let hub = ConnectionHub::new(HubConfig::default());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let id = hub.register(tx).await.unwrap();

        handle_client_message(
            &hub,
            &id,
            ClientMessage::Subscribe {
                topics: vec!["carros".to_string(), "bogus".to_string()],
            },
        )
        .await;
        assert_eq!(
            rx.recv().await,
            Some(ServerMessage::Subscribed {
                topics: vec!["carros".to_string()]
            })
        );

        handle_client_message(&hub, &id, ClientMessage::Ping).await;
        assert_eq!(rx.recv().await, Some(ServerMessage::Pong));
    }
}

//! Realtime change stream
//!
//! Browsers connect to `/api/v1/ws` (session token in `access_token`) and
//! subscribe to `carros`, `leads` or `*`. Every committed write on a table
//! is pushed as a `change` message so the open page can reload.
//!
//! ```javascript
//! const ws = new WebSocket(`ws://localhost:8082/api/v1/ws?access_token=${token}&topics=leads`);
//! ws.onmessage = (e) => {
//!   const msg = JSON.parse(e.data);
//!   if (msg.type === 'change') reload(msg.table);
//! };
//! ```

mod bridge;
mod handler;
mod hub;
mod messages;

pub use bridge::RealtimeBridge;
pub use handler::websocket_handler;
pub use hub::{ConnectionHub, HubConfig, HubError};
pub use messages::{ClientMessage, ServerMessage, WsEvent, ALL_TOPICS};

//! WebSocket Messaging Client
//!
//! Event-driven client for the chat server's WebSocket endpoint.
//!
//! ## Architecture
//!
//! - **WsClient**: owns the single live connection and its lifecycle
//! - **EventRouter**: maps event-type keys to ordered subscriber lists
//! - **Messages**: the chat wire envelope and event-type constants
//! - **Hooks**: lifecycle callbacks (open, error, close)
//!
//! ## Usage
//!
//! Every frame on the wire is a JSON object carrying a `type` field;
//! subscribers register per type and receive the full decoded frame:
//!
//! ```rust,no_run
//! use roomlink::WsClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = WsClient::new("ws://localhost:8080", "/ChatRoom/alice/lobby")?;
//!
//! client.subscribe("user_join", |frame| {
//!     println!("joined: {}", frame["userName"]);
//! });
//!
//! client.connect().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod hooks;
mod messages;
mod router;

pub use client::{ConnectionState, WsClient, WsClientError};
pub use hooks::{ConnectionError, DisconnectReason, LifecycleHooks};
pub use messages::{event_type, frame_type, now, ChatMessage};
pub use router::{EventCallback, EventRouter};

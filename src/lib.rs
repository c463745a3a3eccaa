//! # Roomlink
//!
//! Client library for chat-room servers speaking JSON over WebSocket.
//!
//! ## Features
//!
//! - **Event-driven messaging**: one live WebSocket connection,
//!   publish/subscribe routing of inbound frames by their `type` field
//! - **Explicit lifecycle**: idempotent connect/close with an observable
//!   state machine and lifecycle hooks
//! - **Room API**: HTTP access to room information (online count,
//!   chat history) sharing the same base-URL configuration
//!
//! ## Modules
//!
//! - [`websocket`]: the WebSocket client and event router
//! - [`api`]: the room information HTTP client
//! - [`config`]: TOML + environment configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomlink::{ChatMessage, Config, WsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load_default();
//!
//!     // One client per endpoint; the path picks the user and room
//!     let client = WsClient::new(config.ws_base_url(), "/ChatRoom/alice/lobby")?;
//!
//!     // Subscribers receive the full decoded frame
//!     client.subscribe("chat_message", |frame| {
//!         println!("{}: {}", frame["userName"], frame["message"]);
//!     });
//!
//!     client.connect().await;
//!
//!     // ... once the connection is open:
//!     client.send(&ChatMessage::chat("lobby", "alice", "hello")).await?;
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod websocket;

// Re-export top-level types for convenience
pub use api::{ApiClient, ApiError};

pub use config::{Config, ConfigError, LoggingConfig, ServerConfig, WebSocketConfig};

pub use websocket::{
    event_type, ChatMessage, ConnectionError, ConnectionState, DisconnectReason, EventRouter,
    LifecycleHooks, WsClient, WsClientError,
};

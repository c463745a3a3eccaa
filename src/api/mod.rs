//! Chat Server HTTP API
//!
//! REST access to the chat server's room information endpoints. The
//! WebSocket carries the live conversation; this client answers the
//! out-of-band questions (who is online, what was said before).

mod client;

pub use client::{ApiClient, ApiError};

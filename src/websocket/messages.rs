//! Chat Wire Messages
//!
//! Defines the message envelope exchanged with the chat server. Every
//! frame is a JSON object whose `type` field is the routing key; all
//! other fields belong to the event payload and are forwarded to
//! subscribers untouched.

use chrono::Local;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Event types used as routing keys on the wire.
pub mod event_type {
    /// A user-authored chat message.
    pub const CHAT_MESSAGE: &str = "chat_message";
    /// An announcement generated by the server.
    pub const SERVER_MESSAGE: &str = "server_message";
    /// Replay of a room's message history.
    pub const CHAT_HISTORY: &str = "chat_history";
    /// A user joined the room.
    pub const USER_JOIN: &str = "user_join";
    /// A user left the room.
    pub const USER_QUIT: &str = "user_quit";
}

/// Timestamp format used on the wire (matches the server's formatter).
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// The chat message envelope.
///
/// Serialized with camelCase field names, as the server expects. The
/// routing key is carried in the `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    /// Room the message belongs to
    pub room_name: String,
    /// Account name of the sender
    pub user_name: String,
    /// Display name chosen by the sender, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_name: Option<String>,
    /// Wall-clock timestamp, formatted `YYYY-MM-DD HH:MM:SS`
    pub time: String,
    /// Message body; absent for join/quit notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Event type routing key
    #[serde(rename = "type")]
    pub kind: String,
}

impl ChatMessage {
    /// Create a user chat message stamped with the current local time.
    pub fn chat(room_name: &str, user_name: &str, text: &str) -> Self {
        Self {
            room_name: room_name.to_string(),
            user_name: user_name.to_string(),
            custom_name: None,
            time: now(),
            message: Some(text.to_string()),
            kind: event_type::CHAT_MESSAGE.to_string(),
        }
    }

    /// Set the sender's display name.
    pub fn custom_name(mut self, name: &str) -> Self {
        self.custom_name = Some(name.to_string());
        self
    }
}

/// Current local time in the wire timestamp format.
pub fn now() -> String {
    Local::now().format(TIME_FORMAT).to_string()
}

/// Extract the routing key from a decoded inbound frame.
///
/// Returns `None` when the frame has no `type` field or the field is not
/// a string; such frames are dropped by the dispatch path.
pub fn frame_type(frame: &Value) -> Option<&str> {
    frame.get("type")?.as_str()
}

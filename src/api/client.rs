//! Room Information API Client
//!
//! HTTP client for the chat server's REST endpoints. Shares the base-URL
//! configuration with the WebSocket client and uses a fixed request
//! timeout.

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

use crate::config::ServerConfig;

/// Result code the server uses for successful responses.
const SUCCESS_CODE: i32 = 200;

/// Chat server REST API client
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from the server configuration.
    pub fn new(config: &ServerConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_millis(config.request_timeout_ms))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The base URL requests are issued against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of users currently connected to a room.
    pub async fn online_count(&self, room_name: &str) -> Result<u32, ApiError> {
        let url = format!("{}/RoomInformation/getOnlineCount", self.base_url);
        self.get(&url, room_name).await
    }

    /// The recorded chat history of a room, as the server renders it.
    pub async fn chat_history(&self, room_name: &str) -> Result<String, ApiError> {
        let url = format!("{}/RoomInformation/getChatHistory", self.base_url);
        self.get(&url, room_name).await
    }

    /// Issue a GET with the `roomName` query parameter and unwrap the
    /// server's result envelope.
    async fn get<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        room_name: &str,
    ) -> Result<T, ApiError> {
        tracing::debug!(url = %url, room = %room_name, "Fetching room information");
        let response = self
            .client
            .get(url)
            .query(&[("roomName", room_name)])
            .send()
            .await
            .map_err(classify)?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Api {
                code: status.as_u16() as i32,
                message: text,
            });
        }

        let body: ApiResult<T> = response.json().await.map_err(ApiError::Request)?;
        body.into_data()
    }
}

/// Map a reqwest failure to the client error taxonomy.
fn classify(e: reqwest::Error) -> ApiError {
    if e.is_timeout() {
        ApiError::Timeout
    } else if e.is_connect() {
        ApiError::Unavailable
    } else {
        ApiError::Request(e)
    }
}

/// The server's result envelope: `{code, msg, data}`.
#[derive(Debug, Deserialize)]
struct ApiResult<T> {
    code: i32,
    #[serde(default)]
    msg: Option<String>,
    data: Option<T>,
}

impl<T> ApiResult<T> {
    /// Unwrap the payload, mapping non-success codes to [`ApiError::Api`].
    fn into_data(self) -> Result<T, ApiError> {
        if self.code != SUCCESS_CODE {
            return Err(ApiError::Api {
                code: self.code,
                message: self.msg.unwrap_or_default(),
            });
        }
        self.data.ok_or(ApiError::Api {
            code: self.code,
            message: "response carried no data".to_string(),
        })
    }
}

/// Errors from the room information API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Chat server unavailable")]
    Unavailable,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API error {code}: {message}")]
    Api { code: i32, message: String },

    #[error("Request timeout")]
    Timeout,
}

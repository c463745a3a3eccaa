//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub websocket: WebSocketConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Chat server connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout() -> u64 {
    30_000 // 30 seconds
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// WebSocket endpoint configuration
///
/// When `url` is unset, the WebSocket base is derived from
/// `server.base_url` by converting the scheme (`http` → `ws`,
/// `https` → `wss`).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WebSocketConfig {
    pub url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        // Try default config locations
        let config_paths = [
            dirs::config_dir().map(|p| p.join("roomlink").join("config.toml")),
            Some(PathBuf::from("/etc/roomlink/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        // Fall back to environment-only config
        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// The WebSocket base URL for this configuration
    ///
    /// Uses the explicit `[websocket] url` when present, otherwise derives
    /// it from the server base URL by switching the scheme.
    pub fn ws_base_url(&self) -> String {
        match &self.websocket.url {
            Some(url) => url.clone(),
            None => self
                .server
                .base_url
                .replacen("https://", "wss://", 1)
                .replacen("http://", "ws://", 1),
        }
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Server overrides
        if let Ok(base_url) = std::env::var("ROOMLINK_BASE_URL") {
            self.server.base_url = base_url;
        }
        if let Ok(timeout) = std::env::var("ROOMLINK_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = timeout.parse() {
                self.server.request_timeout_ms = ms;
            }
        }

        // WebSocket overrides
        if let Ok(url) = std::env::var("ROOMLINK_WS_URL") {
            self.websocket.url = Some(url);
        }

        // Logging overrides
        if let Ok(level) = std::env::var("ROOMLINK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("ROOMLINK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            websocket: WebSocketConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Roomlink Configuration
#
# Environment variables override these settings:
# - ROOMLINK_BASE_URL
# - ROOMLINK_REQUEST_TIMEOUT_MS
# - ROOMLINK_WS_URL
# - ROOMLINK_LOG_LEVEL
# - ROOMLINK_LOG_FORMAT

[server]
# Chat server base URL (shared by the HTTP API and the WebSocket client)
base_url = "http://localhost:8080"

# HTTP request timeout (ms)
request_timeout_ms = 30000

[websocket]
# Explicit WebSocket base URL. When omitted, it is derived from
# server.base_url by switching http -> ws / https -> wss.
# url = "ws://localhost:8080"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/roomlink/roomlink.log"
"#
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.base_url, "http://localhost:8080");
        assert_eq!(config.server.request_timeout_ms, 30_000);
        assert!(config.websocket.url.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_ws_base_url_derived_from_server() {
        let config = Config::default();
        assert_eq!(config.ws_base_url(), "ws://localhost:8080");

        let mut secure = Config::default();
        secure.server.base_url = "https://chat.example.com".to_string();
        assert_eq!(secure.ws_base_url(), "wss://chat.example.com");
    }

    #[test]
    fn test_ws_base_url_explicit_override() {
        let mut config = Config::default();
        config.websocket.url = Some("ws://other.example.com:9000".to_string());
        assert_eq!(config.ws_base_url(), "ws://other.example.com:9000");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[server]
base_url = "http://chat.local:9090"

[logging]
level = "debug"
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.server.base_url, "http://chat.local:9090");
        // Unset fields fall back to their defaults
        assert_eq!(config.server.request_timeout_ms, 30_000);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "pretty");
    }

    #[test]
    fn test_load_rejects_invalid_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server\nbase_url = ").unwrap();

        let result = Config::load(file.path());
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn test_generate_default_config_parses() {
        let content = generate_default_config();
        let config: Config = toml::from_str(&content).unwrap();
        assert_eq!(config.server.base_url, "http://localhost:8080");
    }
}

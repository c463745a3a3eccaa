//! Connection Lifecycle Hooks
//!
//! Callback-based hooks for observing the WebSocket connection:
//!
//! - [`on_open`](LifecycleHooks::on_open): fired when the connection is established
//! - [`on_error`](LifecycleHooks::on_error): fired on transport-level failures
//! - [`on_close`](LifecycleHooks::on_close): fired when the connection closes
//!
//! All hooks are optional. Connection errors are where an application
//! surfaces its user-visible notification; when no hook is registered the
//! client falls back to structured logging.

use std::fmt;
use std::sync::Arc;

/// Reason for a close event.
#[derive(Debug, Clone)]
pub struct DisconnectReason {
    /// Human-readable description of why the connection closed.
    pub message: String,
    /// WebSocket close code, if available (e.g. 1000 = normal, 1006 = abnormal).
    pub code: Option<u16>,
}

impl DisconnectReason {
    /// Create a new disconnect reason with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// Create a new disconnect reason with a message and close code.
    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code: {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Error information passed to the `on_error` hook.
#[derive(Debug, Clone)]
pub struct ConnectionError {
    /// Human-readable error message.
    pub message: String,
}

impl ConnectionError {
    /// Create a new connection error.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Type alias for the on_open callback.
pub type OnOpenCallback = Arc<dyn Fn() + Send + Sync>;

/// Type alias for the on_error callback.
pub type OnErrorCallback = Arc<dyn Fn(&ConnectionError) + Send + Sync>;

/// Type alias for the on_close callback.
pub type OnCloseCallback = Arc<dyn Fn(&DisconnectReason) + Send + Sync>;

/// Connection lifecycle hooks.
///
/// Register only the hooks you need; the rest default to log output.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub(crate) on_open: Option<OnOpenCallback>,
    pub(crate) on_error: Option<OnErrorCallback>,
    pub(crate) on_close: Option<OnCloseCallback>,
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field("on_open", &self.on_open.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_close", &self.on_close.is_some())
            .finish()
    }
}

impl LifecycleHooks {
    /// Create an empty hook set (no callbacks registered).
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback invoked when the connection is established.
    pub fn on_open(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_open = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked on transport-level failures.
    ///
    /// This is where an application hooks in its alert-style notification.
    pub fn on_error(mut self, f: impl Fn(&ConnectionError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Register a callback invoked when the connection closes, whether by
    /// a local `close()`, the remote end, or a transport failure.
    pub fn on_close(mut self, f: impl Fn(&DisconnectReason) + Send + Sync + 'static) -> Self {
        self.on_close = Some(Arc::new(f));
        self
    }

    // ---------------------------------------------------------------
    // Internal dispatch helpers
    // ---------------------------------------------------------------

    pub(crate) fn emit_open(&self) {
        match &self.on_open {
            Some(cb) => cb(),
            None => tracing::debug!("WebSocket connection open"),
        }
    }

    pub(crate) fn emit_error(&self, error: &ConnectionError) {
        match &self.on_error {
            Some(cb) => cb(error),
            None => tracing::error!(error = %error, "WebSocket connection error"),
        }
    }

    pub(crate) fn emit_close(&self, reason: &DisconnectReason) {
        match &self.on_close {
            Some(cb) => cb(reason),
            None => tracing::info!(reason = %reason, "WebSocket connection closed"),
        }
    }
}

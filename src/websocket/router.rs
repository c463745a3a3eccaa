//! Event Router
//!
//! Maps event-type keys to ordered lists of subscriber callbacks and fans
//! inbound frames out to them. The registry is append-only: callbacks stay
//! registered for the lifetime of the client that owns the router.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::Value;

/// A subscriber callback, invoked with the full decoded frame.
pub type EventCallback = Arc<dyn Fn(&Value) + Send + Sync>;

/// Routes decoded inbound frames to subscribers by event type.
///
/// Dispatch is synchronous and sequential: callbacks run in registration
/// order on the caller's task, and each invocation is isolated so one
/// panicking subscriber cannot prevent delivery to the rest.
#[derive(Default)]
pub struct EventRouter {
    /// Event type → subscribers, in registration order
    subscribers: RwLock<HashMap<String, Vec<EventCallback>>>,
}

impl EventRouter {
    /// Create a router with no subscriptions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `event_type`.
    ///
    /// Multiple callbacks may be registered under the same key; they are
    /// invoked in registration order. There is no unsubscribe.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) {
        let event_type = event_type.into();
        let mut subs = self
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        subs.entry(event_type).or_default().push(Arc::new(callback));
    }

    /// Deliver `payload` to every subscriber registered for `event_type`,
    /// in registration order. Returns the number of callbacks invoked.
    ///
    /// Unmatched event types are expected (subscribers register lazily)
    /// and dropped without error.
    pub fn dispatch(&self, event_type: &str, payload: &Value) -> usize {
        let callbacks = {
            let subs = self
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            match subs.get(event_type) {
                Some(list) => list.clone(),
                None => {
                    tracing::trace!(event_type = %event_type, "No subscribers for event");
                    return 0;
                }
            }
        };

        // The lock is released before callbacks run, so a subscriber may
        // itself call subscribe() without deadlocking.
        for callback in &callbacks {
            if catch_unwind(AssertUnwindSafe(|| callback(payload))).is_err() {
                tracing::error!(event_type = %event_type, "Subscriber panicked during dispatch");
            }
        }

        callbacks.len()
    }

    /// Number of subscribers registered for an event type.
    pub fn subscriber_count(&self, event_type: &str) -> usize {
        self.subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(event_type)
            .map(|s| s.len())
            .unwrap_or(0)
    }
}

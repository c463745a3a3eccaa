//! WebSocket Client
//!
//! Owns the single live connection to the chat server. Inbound text
//! frames are decoded as JSON and fanned out through the
//! [`EventRouter`] keyed by their `type` field; outbound messages are
//! serialized and written in fire-and-forget fashion.

use std::sync::Arc;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message, MaybeTlsStream};
use uuid::Uuid;

use super::hooks::{ConnectionError, DisconnectReason, LifecycleHooks};
use super::messages::frame_type;
use super::router::EventRouter;

type WsStream = tokio_tungstenite::WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Connection lifecycle states.
///
/// A new transport is created only from `Absent` or `Closed`;
/// `Connecting` and `Open` block another `connect`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// No transport has been created yet
    Absent,
    /// Transport handshake in progress
    Connecting,
    /// Transport established; sends are allowed
    Open,
    /// Transport has shut down; `connect` may be called again
    Closed,
}

/// Errors returned by client operations.
#[derive(Debug, Error)]
pub enum WsClientError {
    #[error("connection is not open")]
    NotConnected,

    #[error("invalid endpoint {url:?}: {reason}")]
    InvalidEndpoint { url: String, reason: String },

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// WebSocket client for a single chat server endpoint.
///
/// One instance is created per logical endpoint and lives for the session
/// that needs it; the connection itself can cycle through repeated
/// `connect`/`close` calls without recreating the client.
///
/// # Examples
///
/// ```rust,no_run
/// use roomlink::WsClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = WsClient::new("ws://localhost:8080", "/ChatRoom/alice/lobby")?;
/// client.subscribe("chat_message", |frame| println!("{}", frame));
/// client.connect().await;
/// client.send(&serde_json::json!({"type": "chat_message", "message": "hi"})).await?;
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub struct WsClient {
    endpoint: String,
    state: Arc<RwLock<ConnectionState>>,
    router: Arc<EventRouter>,
    hooks: LifecycleHooks,
    /// Sender half of the outbound frame queue; present while a
    /// connection exists. Dropping it tells the writer task to shut the
    /// transport down.
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<Message>>>>,
}

impl WsClient {
    /// Create a client for `base_url` + `path`.
    ///
    /// `base_url` may use `ws`/`wss` directly or `http`/`https`, which are
    /// converted. The composed endpoint is fixed for the client's lifetime.
    pub fn new(base_url: impl AsRef<str>, path: &str) -> Result<Self, WsClientError> {
        let endpoint = endpoint_url(base_url.as_ref(), path)?;
        Ok(Self {
            endpoint,
            state: Arc::new(RwLock::new(ConnectionState::Absent)),
            router: Arc::new(EventRouter::new()),
            hooks: LifecycleHooks::new(),
            outbound: Arc::new(RwLock::new(None)),
        })
    }

    /// Replace the lifecycle hooks. Call before `connect`.
    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// The endpoint this client connects to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Current connection state.
    pub async fn state(&self) -> ConnectionState {
        *self.state.read().await
    }

    /// Whether the connection is open and sends are allowed.
    pub async fn is_open(&self) -> bool {
        self.state().await == ConnectionState::Open
    }

    /// Register `callback` for inbound frames whose `type` equals
    /// `event_type`. Callbacks are invoked in registration order with the
    /// full decoded frame.
    pub fn subscribe(
        &self,
        event_type: impl Into<String>,
        callback: impl Fn(&Value) + Send + Sync + 'static,
    ) {
        self.router.subscribe(event_type, callback);
    }

    /// The router holding this client's subscriptions.
    pub fn router(&self) -> &EventRouter {
        &self.router
    }

    /// Open the connection if none exists.
    ///
    /// Only acts when the state is `Absent` or `Closed`; while
    /// `Connecting` or `Open` the call is a logged no-op, so no second
    /// transport is ever created. Completes immediately; the handshake
    /// runs on a background task and its outcome is reported through the
    /// lifecycle hooks.
    pub async fn connect(&self) {
        {
            let mut state = self.state.write().await;
            match *state {
                ConnectionState::Connecting | ConnectionState::Open => {
                    tracing::debug!(
                        endpoint = %self.endpoint,
                        state = ?*state,
                        "Connect ignored: connection already active"
                    );
                    return;
                }
                ConnectionState::Absent | ConnectionState::Closed => {
                    *state = ConnectionState::Connecting;
                }
            }
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        *self.outbound.write().await = Some(outbound_tx);

        tokio::spawn(run_connection(
            self.endpoint.clone(),
            Arc::clone(&self.state),
            Arc::clone(&self.outbound),
            Arc::clone(&self.router),
            self.hooks.clone(),
            outbound_rx,
        ));
    }

    /// Serialize `message` as JSON and write it as one text frame.
    ///
    /// Fire and forget: there is no delivery acknowledgement. Fails with
    /// [`WsClientError::NotConnected`] when the connection is not open;
    /// the failure is local and never panics.
    pub async fn send<T: Serialize + ?Sized>(&self, message: &T) -> Result<(), WsClientError> {
        if self.state().await != ConnectionState::Open {
            tracing::warn!(endpoint = %self.endpoint, "Send rejected: connection is not open");
            return Err(WsClientError::NotConnected);
        }

        let payload = serde_json::to_string(message)?;

        let outbound = self.outbound.read().await;
        match outbound.as_ref() {
            Some(tx) if tx.send(Message::Text(payload.into())).is_ok() => Ok(()),
            _ => {
                // The connection tore down between the state check and here.
                tracing::warn!(endpoint = %self.endpoint, "Send rejected: connection shut down");
                Err(WsClientError::NotConnected)
            }
        }
    }

    /// Request shutdown of the current connection, if any.
    ///
    /// Idempotent: with no active connection this is a successful no-op.
    /// The state transitions to `Closed` (and the close hook fires) once
    /// the transport teardown completes; frames already queued by the
    /// transport may still be delivered before that.
    pub async fn close(&self) {
        if self.outbound.write().await.take().is_some() {
            tracing::debug!(endpoint = %self.endpoint, "Close requested");
        } else {
            tracing::debug!(endpoint = %self.endpoint, "Close ignored: no active connection");
        }
    }
}

/// Compose the full endpoint from a base URL and a path.
///
/// `http`/`https` bases are converted to `ws`/`wss`; `ws`/`wss` pass
/// through. Anything else is rejected.
fn endpoint_url(base_url: &str, path: &str) -> Result<String, WsClientError> {
    let base = base_url.trim().trim_end_matches('/');

    let base = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(WsClientError::InvalidEndpoint {
            url: base_url.to_string(),
            reason: "expected an http(s):// or ws(s):// base URL".to_string(),
        });
    };

    let path = path.trim();
    let sep = if path.starts_with('/') { "" } else { "/" };
    Ok(format!("{}{}{}", base, sep, path))
}

/// Background task owning one connection from handshake to teardown.
async fn run_connection(
    endpoint: String,
    state: Arc<RwLock<ConnectionState>>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<Message>>>>,
    router: Arc<EventRouter>,
    hooks: LifecycleHooks,
    outbound_rx: mpsc::UnboundedReceiver<Message>,
) {
    let connection_id = Uuid::new_v4();

    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            tracing::error!(
                connection_id = %connection_id,
                endpoint = %endpoint,
                error = %e,
                "WebSocket connect failed"
            );
            hooks.emit_error(&ConnectionError::new(format!(
                "connection to {} failed: {}",
                endpoint, e
            )));
            // Release the outbound slot before the state becomes
            // connect-allowed again.
            outbound.write().await.take();
            *state.write().await = ConnectionState::Closed;
            return;
        }
    };

    *state.write().await = ConnectionState::Open;
    tracing::info!(connection_id = %connection_id, endpoint = %endpoint, "WebSocket connected");
    hooks.emit_open();

    let (sink, source) = stream.split();

    // Writer and reader run as separate tasks; whichever finishes first
    // decides the disconnect reason and the other is aborted.
    let mut send_task = tokio::spawn(write_loop(sink, outbound_rx));
    let mut recv_task = tokio::spawn(read_loop(source, Arc::clone(&router), hooks.clone()));

    let reason = tokio::select! {
        res = &mut send_task => {
            recv_task.abort();
            res.unwrap_or_else(|_| DisconnectReason::new("send task failed"))
        }
        res = &mut recv_task => {
            send_task.abort();
            res.unwrap_or_else(|_| DisconnectReason::new("receive task failed"))
        }
    };

    // Release the outbound slot before the state becomes connect-allowed
    // again.
    outbound.write().await.take();
    *state.write().await = ConnectionState::Closed;

    tracing::info!(connection_id = %connection_id, reason = %reason, "WebSocket disconnected");
    hooks.emit_close(&reason);
}

/// Forward queued outbound frames to the transport.
async fn write_loop(
    mut sink: SplitSink<WsStream, Message>,
    mut outbound_rx: mpsc::UnboundedReceiver<Message>,
) -> DisconnectReason {
    while let Some(frame) = outbound_rx.recv().await {
        if let Err(e) = sink.send(frame).await {
            return DisconnectReason::new(format!("write failed: {}", e));
        }
    }

    // All senders are gone: close() was called. Say goodbye to the server.
    let _ = sink.send(Message::Close(None)).await;
    DisconnectReason::with_code("closed by client", 1000)
}

/// Read transport frames and dispatch text frames to subscribers.
async fn read_loop(
    mut source: SplitStream<WsStream>,
    router: Arc<EventRouter>,
    hooks: LifecycleHooks,
) -> DisconnectReason {
    while let Some(result) = source.next().await {
        match result {
            Ok(Message::Text(text)) => dispatch_frame(&router, &text),
            Ok(Message::Binary(_)) => {
                tracing::debug!("Ignoring unsupported binary frame");
            }
            // Pings are answered by the protocol layer.
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {}
            Ok(Message::Close(frame)) => {
                return match frame {
                    Some(f) => DisconnectReason::with_code(f.reason.to_string(), f.code.into()),
                    None => DisconnectReason::new("closed by server"),
                };
            }
            Err(e) => {
                let error = ConnectionError::new(format!("transport error: {}", e));
                hooks.emit_error(&error);
                return DisconnectReason::new(error.message);
            }
        }
    }
    DisconnectReason::new("server closed the connection")
}

/// Decode one inbound text frame and route it by its `type` field.
///
/// Malformed JSON and frames without a string `type` are logged and
/// dropped; a single bad frame must not take down the dispatch loop.
fn dispatch_frame(router: &EventRouter, text: &str) {
    let frame: Value = match serde_json::from_str(text) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::warn!(error = %e, "Dropping malformed inbound frame");
            return;
        }
    };

    match frame_type(&frame) {
        Some(event_type) => {
            let delivered = router.dispatch(event_type, &frame);
            tracing::trace!(event_type = %event_type, delivered, "Dispatched inbound frame");
        }
        None => {
            tracing::warn!("Dropping inbound frame without a string `type` field");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio_tungstenite::accept_async;

    // ── test server ─────────────────────────────────────────────────────

    /// A single in-process WebSocket server on an ephemeral port.
    ///
    /// Frames written by the client show up on `received`; frames pushed
    /// into `inject` are delivered to the client. `connections` counts
    /// accepted transports, which is how the connect-idempotence property
    /// is observed.
    struct TestServer {
        url: String,
        connections: Arc<AtomicUsize>,
        received: mpsc::UnboundedReceiver<String>,
        inject: mpsc::UnboundedSender<String>,
    }

    async fn spawn_server() -> TestServer {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());

        let connections = Arc::new(AtomicUsize::new(0));
        let (received_tx, received) = mpsc::unbounded_channel();
        let (inject, mut inject_rx) = mpsc::unbounded_channel::<String>();

        let conn_count = Arc::clone(&connections);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                conn_count.fetch_add(1, Ordering::SeqCst);
                let ws = match accept_async(stream).await {
                    Ok(ws) => ws,
                    Err(_) => continue,
                };
                let (mut sink, mut source) = ws.split();
                let received_tx = received_tx.clone();

                loop {
                    tokio::select! {
                        msg = source.next() => match msg {
                            Some(Ok(Message::Text(text))) => {
                                let _ = received_tx.send(text.to_string());
                            }
                            Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                            Some(Ok(_)) => {}
                        },
                        frame = inject_rx.recv() => match frame {
                            Some(frame) => {
                                if sink.send(Message::Text(frame.into())).await.is_err() {
                                    break;
                                }
                            }
                            None => break,
                        },
                    }
                }
            }
        });

        TestServer {
            url,
            connections,
            received,
            inject,
        }
    }

    async fn wait_for_state(client: &WsClient, want: ConnectionState) {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while client.state().await != want {
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for {:?}",
                want
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn recv_frame(rx: &mut mpsc::UnboundedReceiver<String>) -> String {
        tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for a frame")
            .expect("server channel closed")
    }

    // ── endpoint composition ────────────────────────────────────────────

    #[test]
    fn test_endpoint_url_scheme_conversion() {
        assert_eq!(
            endpoint_url("http://localhost:8080", "/chat/room1").unwrap(),
            "ws://localhost:8080/chat/room1"
        );
        assert_eq!(
            endpoint_url("https://chat.example.com", "/chat/room1").unwrap(),
            "wss://chat.example.com/chat/room1"
        );
        assert_eq!(
            endpoint_url("ws://localhost:8080", "/chat/room1").unwrap(),
            "ws://localhost:8080/chat/room1"
        );
    }

    #[test]
    fn test_endpoint_url_normalizes_separators() {
        assert_eq!(
            endpoint_url("ws://localhost:8080/", "/chat/room1").unwrap(),
            "ws://localhost:8080/chat/room1"
        );
        assert_eq!(
            endpoint_url("ws://localhost:8080", "chat/room1").unwrap(),
            "ws://localhost:8080/chat/room1"
        );
    }

    #[test]
    fn test_endpoint_url_rejects_unknown_scheme() {
        let result = endpoint_url("ftp://localhost", "/chat");
        assert!(matches!(
            result,
            Err(WsClientError::InvalidEndpoint { .. })
        ));
    }

    // ── lifecycle ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_initial_state_is_absent() {
        let client = WsClient::new("ws://localhost:9", "/chat/room1").unwrap();
        assert_eq!(client.state().await, ConnectionState::Absent);
        assert!(!client.is_open().await);
    }

    #[tokio::test]
    async fn test_connect_is_idempotent_while_active() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        client.connect().await;
        client.connect().await; // while connecting
        wait_for_state(&client, ConnectionState::Open).await;
        client.connect().await; // while open
        client.connect().await;

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(server.connections.load(Ordering::SeqCst), 1);
        assert_eq!(client.state().await, ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_send_writes_exactly_one_frame() {
        let mut server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        let message = json!({"type": "join", "room": "room1"});
        client.send(&message).await.unwrap();

        let written = recv_frame(&mut server.received).await;
        assert_eq!(written, serde_json::to_string(&message).unwrap());

        // Exactly one write
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(server.received.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_send_while_not_open_fails_locally() {
        let client = WsClient::new("ws://localhost:9", "/chat/room1").unwrap();
        let result = client.send(&json!({"type": "join"})).await;
        assert!(matches!(result, Err(WsClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_send_after_close_fails_locally() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;
        client.close().await;
        wait_for_state(&client, ConnectionState::Closed).await;

        let result = client.send(&json!({"type": "join"})).await;
        assert!(matches!(result, Err(WsClientError::NotConnected)));
    }

    #[tokio::test]
    async fn test_inbound_frame_reaches_subscriber() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        client.subscribe("foo", move |frame| {
            let _ = seen_tx.send(frame.clone());
        });

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        server
            .inject
            .send(r#"{"type":"foo","x":1}"#.to_string())
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .expect("timed out waiting for dispatch")
            .unwrap();
        assert_eq!(frame, json!({"type": "foo", "x": 1}));

        // Exactly one invocation
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(seen_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_unmatched_inbound_type_is_ignored() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        client.subscribe("expected", move |frame| {
            let _ = seen_tx.send(frame.clone());
        });

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        server
            .inject
            .send(r#"{"type":"surprise","x":1}"#.to_string())
            .unwrap();

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(seen_rx.try_recv().is_err());
        assert_eq!(client.state().await, ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_malformed_inbound_frame_is_dropped() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        let (seen_tx, mut seen_rx) = mpsc::unbounded_channel();
        client.subscribe("foo", move |frame| {
            let _ = seen_tx.send(frame.clone());
        });

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        // Broken JSON, then a frame without a type, then a valid frame:
        // only the valid one is delivered and the connection survives.
        server.inject.send("{not json".to_string()).unwrap();
        server.inject.send(r#"{"x":1}"#.to_string()).unwrap();
        server
            .inject
            .send(r#"{"type":"foo","ok":true}"#.to_string())
            .unwrap();

        let frame = tokio::time::timeout(Duration::from_secs(5), seen_rx.recv())
            .await
            .expect("timed out waiting for dispatch")
            .unwrap();
        assert_eq!(frame, json!({"type": "foo", "ok": true}));
        assert_eq!(client.state().await, ConnectionState::Open);
    }

    #[tokio::test]
    async fn test_close_twice_is_a_noop() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        client.close().await;
        wait_for_state(&client, ConnectionState::Closed).await;
        client.close().await; // no-op, no fault
        assert_eq!(client.state().await, ConnectionState::Closed);
    }

    #[tokio::test]
    async fn test_close_without_connection_is_a_noop() {
        let client = WsClient::new("ws://localhost:9", "/chat/room1").unwrap();
        client.close().await;
        assert_eq!(client.state().await, ConnectionState::Absent);
    }

    #[tokio::test]
    async fn test_reconnect_after_close() {
        let server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;
        client.close().await;
        wait_for_state(&client, ConnectionState::Closed).await;

        // Closed is a connect-allowed state
        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;
        assert_eq!(server.connections.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_connect_reports_error_and_closes() {
        let (error_tx, mut error_rx) = mpsc::unbounded_channel();
        // Nothing listens on port 9 (discard); the handshake must fail.
        let client = WsClient::new("ws://127.0.0.1:9", "/chat/room1")
            .unwrap()
            .with_hooks(LifecycleHooks::new().on_error(move |e| {
                let _ = error_tx.send(e.message.clone());
            }));

        client.connect().await;
        wait_for_state(&client, ConnectionState::Closed).await;

        let reported = tokio::time::timeout(Duration::from_secs(5), error_rx.recv())
            .await
            .expect("timed out waiting for error hook")
            .unwrap();
        assert!(reported.contains("failed"));
    }

    #[tokio::test]
    async fn test_open_and_close_hooks_fire() {
        let server = spawn_server().await;
        let opened = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicUsize::new(0));

        let o = Arc::clone(&opened);
        let c = Arc::clone(&closed);
        let client = WsClient::new(&server.url, "/chat/room1")
            .unwrap()
            .with_hooks(
                LifecycleHooks::new()
                    .on_open(move || {
                        o.fetch_add(1, Ordering::SeqCst);
                    })
                    .on_close(move |_| {
                        c.fetch_add(1, Ordering::SeqCst);
                    }),
            );

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;
        assert_eq!(opened.load(Ordering::SeqCst), 1);

        client.close().await;
        wait_for_state(&client, ConnectionState::Closed).await;

        let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
        while closed.load(Ordering::SeqCst) == 0 {
            assert!(tokio::time::Instant::now() < deadline, "close hook never fired");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    // ── end-to-end scenario ─────────────────────────────────────────────

    #[tokio::test]
    async fn test_chat_room_scenario() {
        let mut server = spawn_server().await;
        let client = WsClient::new(&server.url, "/chat/room1").unwrap();

        let (join_tx, mut join_rx) = mpsc::unbounded_channel();
        client.subscribe("join", move |frame| {
            let _ = join_tx.send(frame.clone());
        });

        client.connect().await;
        wait_for_state(&client, ConnectionState::Open).await;

        // Outbound join is written exactly once
        let join = json!({"type": "join", "room": "room1"});
        client.send(&join).await.unwrap();
        let written = recv_frame(&mut server.received).await;
        assert_eq!(written, serde_json::to_string(&join).unwrap());

        // Inbound join reaches the subscriber with the full decoded object
        server
            .inject
            .send(r#"{"type":"join","room":"room1","user":"alice"}"#.to_string())
            .unwrap();
        let frame = tokio::time::timeout(Duration::from_secs(5), join_rx.recv())
            .await
            .expect("timed out waiting for dispatch")
            .unwrap();
        assert_eq!(
            frame,
            json!({"type": "join", "room": "room1", "user": "alice"})
        );
    }
}

//! WebSocket connection manager with fixed-interval auto-reconnect.
//!
//! Owns the socket for its whole lifecycle: connect, flush the on-connect
//! request sequence, pump outbound requests and inbound messages, and on
//! any failure or closure wait a fixed delay and connect again, forever.
//! Parsed inbound messages fan out through a [`tokio::sync::broadcast`]
//! channel; connection state is published on a [`tokio::sync::watch`].
//!
//! # Example
//!
//! ```rust,ignore
//! use titlecast_api::socket::{SocketConfig, SocketHandle};
//! use titlecast_api::protocol::Request;
//! use tokio_util::sync::CancellationToken;
//!
//! let cancel = CancellationToken::new();
//! let config = SocketConfig::new("127.0.0.1", 8080)
//!     .with_on_connect(vec![Request::subscribe(), Request::get_actions()]);
//!
//! let handle = SocketHandle::connect(config, cancel.clone())?;
//! let mut rx = handle.subscribe();
//!
//! while let Ok(message) = rx.recv().await {
//!     println!("{message:?}");
//! }
//!
//! handle.shutdown();
//! ```

use std::sync::Arc;
use std::time::Duration;

use futures_util::{Sink, SinkExt, StreamExt};
use tokio::sync::{broadcast, mpsc, watch};
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::protocol::{Request, ServerMessage};

// ── Broadcast channel capacity ───────────────────────────────────────

const MESSAGE_CHANNEL_CAPACITY: usize = 1024;

/// Delay between reconnection attempts.
///
/// The retry policy is a fixed interval repeated forever -- no backoff,
/// no attempt cap. This is the sole retry policy in the system.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ── ConnectionState ──────────────────────────────────────────────────

/// Lifecycle state of the single server connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn is_connected(self) -> bool {
        self == Self::Connected
    }
}

// ── SocketConfig ─────────────────────────────────────────────────────

/// Where to connect and what to send on every successful open.
#[derive(Debug, Clone)]
pub struct SocketConfig {
    /// Server host (name or address).
    pub server: String,

    /// Server port.
    pub port: u16,

    /// Delay between reconnection attempts. Defaults to [`RECONNECT_DELAY`].
    pub reconnect_delay: Duration,

    /// Requests flushed, in order, immediately after each connection opens
    /// (typically the event subscription followed by the catalog query).
    pub on_connect: Vec<Request>,
}

impl SocketConfig {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            reconnect_delay: RECONNECT_DELAY,
            on_connect: Vec::new(),
        }
    }

    /// Replace the on-connect request sequence.
    pub fn with_on_connect(mut self, requests: Vec<Request>) -> Self {
        self.on_connect = requests;
        self
    }

    /// Override the reconnect delay (tests use a short one).
    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    /// The `ws://` endpoint this config points at.
    pub fn endpoint(&self) -> Result<Url, Error> {
        Ok(Url::parse(&format!("ws://{}:{}/", self.server, self.port))?)
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8080)
    }
}

// ── SocketHandle ─────────────────────────────────────────────────────

/// Handle to the running connection task.
///
/// Exposes outbound [`send`](Self::send), inbound
/// [`subscribe`](Self::subscribe), and the connection-state watch. Call
/// [`shutdown`](Self::shutdown) to tear down the background task.
pub struct SocketHandle {
    out_tx: mpsc::UnboundedSender<Request>,
    message_rx: broadcast::Receiver<Arc<ServerMessage>>,
    state_rx: watch::Receiver<ConnectionState>,
    cancel: CancellationToken,
}

impl SocketHandle {
    /// Validate the endpoint and spawn the connection loop.
    ///
    /// Returns immediately once the background task is spawned. The first
    /// connection attempt happens asynchronously -- watch
    /// [`state`](Self::state) or subscribe to messages to observe it.
    pub fn connect(config: SocketConfig, cancel: CancellationToken) -> Result<Self, Error> {
        let endpoint = config.endpoint()?;

        let (message_tx, message_rx) = broadcast::channel(MESSAGE_CHANNEL_CAPACITY);
        let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let task_cancel = cancel.clone();
        tokio::spawn(async move {
            socket_loop(endpoint, config, message_tx, state_tx, out_rx, task_cancel).await;
        });

        Ok(Self {
            out_tx,
            message_rx,
            state_rx,
            cancel,
        })
    }

    /// Queue a request for transmission on the open connection.
    ///
    /// Fails with [`Error::NotConnected`] while the link is down; nothing
    /// is queued across reconnects.
    pub fn send(&self, request: Request) -> Result<(), Error> {
        if !self.state_rx.borrow().is_connected() {
            return Err(Error::NotConnected);
        }
        self.out_tx.send(request).map_err(|_| Error::SocketGone)
    }

    /// Get a new broadcast receiver for the inbound message stream.
    ///
    /// Multiple consumers can subscribe concurrently. If a consumer falls
    /// behind, it receives [`broadcast::error::RecvError::Lagged`].
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<ServerMessage>> {
        self.message_rx.resubscribe()
    }

    /// Watch receiver for connection-state transitions.
    pub fn state(&self) -> watch::Receiver<ConnectionState> {
        self.state_rx.clone()
    }

    /// The connection state right now.
    pub fn current_state(&self) -> ConnectionState {
        *self.state_rx.borrow()
    }

    /// Signal the background task to shut down gracefully.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ── Background reconnection loop ─────────────────────────────────────

/// Main loop: connect → pump → on close or error, fixed delay → reconnect.
async fn socket_loop(
    endpoint: Url,
    config: SocketConfig,
    message_tx: broadcast::Sender<Arc<ServerMessage>>,
    state_tx: watch::Sender<ConnectionState>,
    mut out_rx: mpsc::UnboundedReceiver<Request>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            result = run_connection(&endpoint, &config, &message_tx, &state_tx, &mut out_rx, &cancel) => {
                state_tx.send_replace(ConnectionState::Disconnected);

                match result {
                    Ok(()) => tracing::info!("WebSocket disconnected, reconnecting"),
                    Err(e) => tracing::warn!(error = %e, "WebSocket error"),
                }

                tracing::debug!(
                    delay_ms = config.reconnect_delay.as_millis() as u64,
                    "Waiting before reconnect"
                );

                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(config.reconnect_delay) => {}
                }
            }
        }
    }

    state_tx.send_replace(ConnectionState::Disconnected);
    tracing::debug!("Socket loop exiting");
}

// ── Single connection lifecycle ──────────────────────────────────────

/// Establish one connection, flush the on-connect sequence, then pump
/// outbound requests and inbound frames until the connection drops.
async fn run_connection(
    endpoint: &Url,
    config: &SocketConfig,
    message_tx: &broadcast::Sender<Arc<ServerMessage>>,
    state_tx: &watch::Sender<ConnectionState>,
    out_rx: &mut mpsc::UnboundedReceiver<Request>,
    cancel: &CancellationToken,
) -> Result<(), Error> {
    state_tx.send_replace(ConnectionState::Connecting);
    tracing::info!(url = %endpoint, "Connecting to WebSocket");

    let (ws_stream, _response) = tokio_tungstenite::connect_async(endpoint.as_str())
        .await
        .map_err(|e| Error::Connect(e.to_string()))?;

    tracing::info!("WebSocket connected");

    let (mut write, mut read) = ws_stream.split();

    // Requests that accumulated while the link was down are stale by
    // contract: nothing carries across reconnects.
    let mut discarded = 0_usize;
    while out_rx.try_recv().is_ok() {
        discarded += 1;
    }
    if discarded > 0 {
        tracing::debug!(discarded, "Dropped requests queued while disconnected");
    }

    state_tx.send_replace(ConnectionState::Connected);

    for request in &config.on_connect {
        send_request(&mut write, request).await?;
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            outbound = out_rx.recv() => {
                match outbound {
                    Some(request) => send_request(&mut write, &request).await?,
                    // All handles dropped; treat as a clean shutdown.
                    None => return Ok(()),
                }
            }
            frame = read.next() => {
                match frame {
                    Some(Ok(tungstenite::Message::Text(text))) => {
                        parse_and_broadcast(&text, message_tx);
                    }
                    Some(Ok(tungstenite::Message::Ping(_))) => {
                        // tungstenite handles pong replies automatically
                        tracing::trace!("WebSocket ping");
                    }
                    Some(Ok(tungstenite::Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(
                                code = %cf.code,
                                reason = %cf.reason,
                                "WebSocket close frame received"
                            );
                        } else {
                            tracing::info!("WebSocket close frame received (no payload)");
                        }
                        return Ok(());
                    }
                    Some(Err(e)) => {
                        return Err(Error::Connect(e.to_string()));
                    }
                    None => {
                        // Stream ended without a close frame
                        tracing::info!("WebSocket stream ended");
                        return Ok(());
                    }
                    _ => {
                        // Binary, Pong, Frame -- ignore
                    }
                }
            }
        }
    }
}

/// Serialize and transmit one request on the open connection.
async fn send_request<W>(write: &mut W, request: &Request) -> Result<(), Error>
where
    W: Sink<tungstenite::Message, Error = tungstenite::Error> + Unpin,
{
    let text = serde_json::to_string(request)?;
    tracing::debug!(request = ?request.request, id = %request.id, "Sending request");

    write
        .send(tungstenite::Message::text(text))
        .await
        .map_err(|e| Error::Connect(e.to_string()))
}

// ── Message parsing ──────────────────────────────────────────────────

/// Parse a WebSocket text frame and broadcast the envelope.
///
/// Fails closed: a malformed frame is logged and dropped, the connection
/// and the read loop live on.
fn parse_and_broadcast(text: &str, message_tx: &broadcast::Sender<Arc<ServerMessage>>) {
    let message: ServerMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            tracing::debug!(error = %e, "Failed to parse server message");
            return;
        }
    };

    // Ignore send errors -- just means no active subscribers right now
    let _ = message_tx.send(Arc::new(message));
}

// ── Tests ────────────────────────────────────────────────────────────

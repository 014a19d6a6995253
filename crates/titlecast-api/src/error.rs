use thiserror::Error as ThisError;

/// Top-level error type for the `titlecast-api` crate.
///
/// Covers the two failure surfaces of the crate: establishing/holding the
/// WebSocket connection and encoding outbound requests. `titlecast-core`
/// decides what (if anything) to surface to the user.
#[derive(Debug, ThisError)]
pub enum Error {
    // ── Connection ──────────────────────────────────────────────────
    /// The configured server/port does not form a valid WebSocket URL.
    #[error("Invalid server address: {0}")]
    InvalidAddress(#[from] url::ParseError),

    /// Connecting failed or an established connection errored out.
    #[error("WebSocket connection failed: {0}")]
    Connect(String),

    /// A request was submitted while the link is down.
    ///
    /// Nothing is queued across reconnects; callers drop the request and
    /// observe effects through the event stream once the link is back.
    #[error("Not connected to the automation server")]
    NotConnected,

    /// The socket task is gone (shut down or panicked).
    #[error("Socket task is no longer running")]
    SocketGone,

    // ── Encoding ────────────────────────────────────────────────────
    /// An outbound request could not be serialized to JSON.
    #[error("Request encoding failed: {0}")]
    Encode(#[from] serde_json::Error),
}

impl Error {
    /// Returns `true` if this failure clears up on its own once the
    /// reconnect loop re-establishes the link.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Connect(_) | Self::NotConnected)
    }
}

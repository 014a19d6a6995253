// ── Core error types ──
//
// User-facing errors from titlecast-core. These are NOT transport-specific --
// consumers never see tungstenite or serde failures directly. The
// `From<titlecast_api::Error>` impl translates transport-layer errors into
// domain-appropriate variants.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach the automation server: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Not connected to the automation server")]
    Disconnected,

    // ── Manifest errors ──────────────────────────────────────────────
    #[error("Cannot load required actions from {origin}: {reason}")]
    ManifestLoad { origin: String, reason: String },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// True for errors that clear up on their own once the link is back.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoreError::ConnectionFailed { .. } | CoreError::Disconnected
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<titlecast_api::Error> for CoreError {
    fn from(err: titlecast_api::Error) -> Self {
        match err {
            titlecast_api::Error::InvalidAddress(e) => CoreError::Config {
                message: format!("Invalid server address: {e}"),
            },
            titlecast_api::Error::Connect(reason) => CoreError::ConnectionFailed { reason },
            // A gone socket task and a down link look the same to callers:
            // the request was not delivered.
            titlecast_api::Error::NotConnected | titlecast_api::Error::SocketGone => {
                CoreError::Disconnected
            }
            titlecast_api::Error::Encode(e) => {
                CoreError::Internal(format!("Request encoding failed: {e}"))
            }
        }
    }
}

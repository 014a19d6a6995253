// titlecast-api: wire protocol and WebSocket connection manager for
// Streamer.bot-compatible automation servers

pub mod error;
pub mod protocol;
pub mod socket;

pub use error::Error;
pub use protocol::{Request, ServerMessage};
pub use socket::{ConnectionState, SocketConfig, SocketHandle};

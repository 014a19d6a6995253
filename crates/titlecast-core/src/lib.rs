//! Business logic between `titlecast-api` and UI consumers.
//!
//! This crate owns the domain model and the reactive session layer for the
//! titlecast workspace:
//!
//! - **[`Session`]** — Central facade managing the full lifecycle:
//!   [`connect()`](Session::connect) opens the socket (which subscribes to
//!   events and queries the action catalog on every link-up), then spawns a
//!   routing task that runs the capability check, applies broadcast
//!   snapshots, and clears the list on disconnect.
//!
//! - **[`RequiredActionSet`]** ([`capability`]) — The manifest of server-side
//!   action names this client depends on, checked once per connection against
//!   the catalog reply.
//!
//! - **[`BroadcastList`]** ([`reconcile`]) — Insertion-ordered broadcast
//!   storage reconciled in place against each snapshot, so unchanged entries
//!   keep their identity and position.
//!
//! - **[`RemoteEvent`]** ([`route`]) — Typed classification of inbound
//!   envelopes. Every `{source, type}` pair dispatches independently.
//!
//! - **Domain model** ([`model`]) — `Platform` and `Broadcast`, plus the
//!   snapshot payload carried by the server's custom event.

pub mod capability;
pub mod command;
pub mod error;
pub mod model;
pub mod reconcile;
pub mod route;
pub mod session;
pub mod status;

// ── Primary re-exports ──────────────────────────────────────────────
pub use titlecast_api::socket::ConnectionState;

pub use capability::{CapabilityState, RequiredActionSet};
pub use error::CoreError;
pub use model::{Broadcast, Platform};
pub use reconcile::{BroadcastList, ReconcileSummary};
pub use route::RemoteEvent;
pub use session::{Session, SessionConfig, SessionEvent};
pub use status::{StatusView, present};

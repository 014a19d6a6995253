// ── Session facade ──
//
// `Session` glues the socket to the domain: it owns the connection
// handle plus a single routing task that consumes the inbound stream,
// runs the capability check once per connection, applies broadcast
// snapshots, and clears the list whenever the link drops. Consumers
// observe it through watch/broadcast channels and dispatch through
// fire-and-forget methods; nothing here waits on a server reply.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use titlecast_api::protocol::Request;
use titlecast_api::socket::{self, ConnectionState, SocketConfig, SocketHandle};

use crate::capability::{CapabilityState, RequiredActionSet};
use crate::command;
use crate::error::CoreError;
use crate::model::Broadcast;
use crate::reconcile::{BroadcastList, ReconcileSummary};
use crate::route::{self, RemoteEvent};
use crate::status::{self, StatusView};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Connection parameters for a session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub server: String,
    pub port: u16,
    /// Fixed pause between reconnect attempts. Overridable for tests;
    /// everything else runs the stock five seconds.
    pub reconnect_delay: Duration,
}

impl SessionConfig {
    pub fn new(server: impl Into<String>, port: u16) -> Self {
        Self {
            server: server.into(),
            port,
            reconnect_delay: socket::RECONNECT_DELAY,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new("127.0.0.1", 8080)
    }
}

/// Push notification from the session to its consumers.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The socket changed state.
    Connection(ConnectionState),
    /// A capability check concluded.
    Capability(CapabilityState),
    /// A snapshot was applied; `entries` is the full reconciled list.
    Broadcasts {
        entries: Vec<Broadcast>,
        summary: ReconcileSummary,
    },
    /// The list was cleared because the link dropped.
    Cleared,
}

/// The main entry point for consumers. Cheaply cloneable; all clones
/// share one socket and one routing task.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    socket: SocketHandle,
    event_tx: broadcast::Sender<SessionEvent>,
    broadcasts: watch::Sender<Vec<Broadcast>>,
    capability: watch::Sender<CapabilityState>,
    cancel: CancellationToken,
}

impl Session {
    /// Open the socket and spawn the routing task.
    ///
    /// `required` is the manifest outcome: `None` means it could not be
    /// loaded, which pins the capability verdict to
    /// [`CapabilityState::ManifestUnavailable`] -- the session still
    /// connects and reports state, but never fetches broadcasts.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(
        config: SessionConfig,
        required: Option<RequiredActionSet>,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        let socket_config = SocketConfig::new(config.server, config.port)
            .with_reconnect_delay(config.reconnect_delay)
            .with_on_connect(vec![Request::subscribe(), Request::get_actions()]);
        let socket = SocketHandle::connect(socket_config, cancel.child_token())?;

        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (broadcasts, _) = watch::channel(Vec::new());
        let (capability, _) = watch::channel(initial_capability(required.as_ref()));

        let session = Self {
            inner: Arc::new(SessionInner {
                socket,
                event_tx,
                broadcasts,
                capability,
                cancel: cancel.clone(),
            }),
        };

        tokio::spawn(routing_task(session.clone(), required, cancel.child_token()));
        Ok(session)
    }

    // ── Observation ──────────────────────────────────────────────────

    /// Subscribe to session events. Events sent before the call are not
    /// replayed; pair this with the snapshot accessors for initial state.
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn connection(&self) -> watch::Receiver<ConnectionState> {
        self.inner.socket.state()
    }

    pub fn current_connection(&self) -> ConnectionState {
        self.inner.socket.current_state()
    }

    /// Latest capability verdict. Persists across reconnects until the
    /// next connection's check replaces it.
    pub fn capability(&self) -> CapabilityState {
        self.inner.capability.borrow().clone()
    }

    /// Current broadcast list in display order.
    pub fn broadcasts(&self) -> Vec<Broadcast> {
        self.inner.broadcasts.borrow().clone()
    }

    /// Widget visibility derived from the current state.
    pub fn status(&self) -> StatusView {
        let youtube_live = self
            .inner
            .broadcasts
            .borrow()
            .iter()
            .filter(|b| b.platform.is_youtube())
            .count();
        status::present(self.current_connection(), &self.capability(), youtube_live)
    }

    // ── Dispatch ─────────────────────────────────────────────────────

    /// Ask the server for a fresh snapshot. Fire-and-forget; the result
    /// arrives as a [`SessionEvent::Broadcasts`].
    pub fn refresh(&self) -> Result<(), CoreError> {
        self.send(command::fetch_broadcasts())
    }

    /// Apply one title across every platform.
    pub fn update_all_titles(&self, title: &str) -> Result<(), CoreError> {
        self.send(command::update_all_titles(title))
    }

    /// Retitle one broadcast on its own platform.
    pub fn update_platform_title(
        &self,
        broadcast: &Broadcast,
        title: &str,
    ) -> Result<(), CoreError> {
        self.send(command::update_platform_title(broadcast, title))
    }

    /// Stop the routing task and close the socket.
    pub fn shutdown(&self) {
        self.inner.cancel.cancel();
    }

    fn send(&self, request: Request) -> Result<(), CoreError> {
        self.inner.socket.send(request).map_err(CoreError::from)
    }

    fn publish(&self, event: SessionEvent) {
        // Ignore send errors -- just means nobody is listening right now.
        let _ = self.inner.event_tx.send(event);
    }
}

fn initial_capability(required: Option<&RequiredActionSet>) -> CapabilityState {
    if required.is_some() {
        CapabilityState::Unknown
    } else {
        CapabilityState::ManifestUnavailable
    }
}

// ── Routing task ─────────────────────────────────────────────────────

/// Consume connection-state changes and inbound messages until cancelled.
async fn routing_task(
    session: Session,
    required: Option<RequiredActionSet>,
    cancel: CancellationToken,
) {
    let mut messages = session.inner.socket.subscribe();
    let mut state = session.inner.socket.state();
    let mut list = BroadcastList::new();
    // The capability check runs once per connection; replies past the
    // first are dropped until the next link-up.
    let mut catalog_handled = false;

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let connection = *state.borrow_and_update();
                if connection == ConnectionState::Disconnected {
                    // Frames the server pushed before the close are still
                    // queued behind the state change; apply them in arrival
                    // order before reporting the drop and clearing.
                    drain_backlog(
                        &session,
                        required.as_ref(),
                        &mut list,
                        &mut catalog_handled,
                        &mut messages,
                    );
                }
                session.publish(SessionEvent::Connection(connection));
                match connection {
                    ConnectionState::Connected => {
                        catalog_handled = false;
                    }
                    ConnectionState::Disconnected => {
                        if !list.is_empty() {
                            // Stale entries must not survive the link.
                            list.clear();
                            session.inner.broadcasts.send_replace(Vec::new());
                            session.publish(SessionEvent::Cleared);
                            debug!("Cleared broadcast list on disconnect");
                        }
                    }
                    ConnectionState::Connecting => {}
                }
            }
            message = messages.recv() => {
                match message {
                    Ok(message) => handle_message(
                        &session,
                        required.as_ref(),
                        &mut list,
                        &mut catalog_handled,
                        &message,
                    ),
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Routing task lagged behind the socket");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }
    debug!("Routing task exiting");
}

/// Apply every message still buffered from the connection that just
/// closed. The socket sleeps through the reconnect delay before it can
/// open a new link, so anything queued here predates the close.
fn drain_backlog(
    session: &Session,
    required: Option<&RequiredActionSet>,
    list: &mut BroadcastList,
    catalog_handled: &mut bool,
    messages: &mut broadcast::Receiver<Arc<titlecast_api::protocol::ServerMessage>>,
) {
    loop {
        match messages.try_recv() {
            Ok(message) => handle_message(session, required, list, catalog_handled, &message),
            Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "Routing task lagged behind the socket");
            }
            Err(_) => break,
        }
    }
}

fn handle_message(
    session: &Session,
    required: Option<&RequiredActionSet>,
    list: &mut BroadcastList,
    catalog_handled: &mut bool,
    message: &titlecast_api::protocol::ServerMessage,
) {
    match route::classify(message) {
        RemoteEvent::Catalog(actions) => {
            if *catalog_handled {
                debug!("Ignoring repeat catalog reply on this connection");
                return;
            }
            *catalog_handled = true;
            handle_catalog(session, required, &actions);
        }
        event @ (RemoteEvent::TwitchStreamUpdate
        | RemoteEvent::YouTubeBroadcastStarted
        | RemoteEvent::YouTubeBroadcastEnded
        | RemoteEvent::YouTubeBroadcastUpdated) => {
            if session.capability().is_satisfied() {
                debug!(?event, "Platform lifecycle changed, re-fetching broadcasts");
                if let Err(e) = session.refresh() {
                    debug!(error = %e, "Re-fetch dispatch failed");
                }
            } else {
                debug!(?event, "Ignoring lifecycle event: capability check not passed");
            }
        }
        RemoteEvent::Snapshot(broadcasts) => {
            let summary = list.apply(&broadcasts);
            let entries = list.snapshot();
            session.inner.broadcasts.send_replace(entries.clone());
            debug!(
                added = summary.added,
                updated = summary.updated,
                removed = summary.removed,
                youtube_live = summary.youtube_live,
                "Applied broadcast snapshot"
            );
            session.publish(SessionEvent::Broadcasts { entries, summary });
        }
        RemoteEvent::Ignored => {}
    }
}

fn handle_catalog(
    session: &Session,
    required: Option<&RequiredActionSet>,
    actions: &[titlecast_api::protocol::ActionDescriptor],
) {
    let verdict = match required {
        Some(set) => {
            let missing = set.missing_from(actions);
            if missing.is_empty() {
                CapabilityState::Satisfied
            } else {
                CapabilityState::Missing(missing)
            }
        }
        None => CapabilityState::ManifestUnavailable,
    };

    match &verdict {
        CapabilityState::Satisfied => {
            info!(catalog = actions.len(), "All required actions present");
        }
        CapabilityState::Missing(names) => {
            warn!(missing = ?names, "Required actions absent from the server");
        }
        CapabilityState::ManifestUnavailable => {
            warn!("No required-actions manifest; broadcast management stays disabled");
        }
        CapabilityState::Unknown => {}
    }

    let satisfied = verdict.is_satisfied();
    session.inner.capability.send_replace(verdict.clone());
    session.publish(SessionEvent::Capability(verdict));

    if satisfied {
        // The one automatic fetch per connection.
        if let Err(e) = session.refresh() {
            debug!(error = %e, "Initial fetch dispatch failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn initial_capability_depends_on_the_manifest_outcome() {
        let set = RequiredActionSet::new(vec!["A".into()]);
        assert_eq!(initial_capability(Some(&set)), CapabilityState::Unknown);
        assert_eq!(
            initial_capability(None),
            CapabilityState::ManifestUnavailable
        );
    }

    #[test]
    fn default_session_config_targets_localhost() {
        let config = SessionConfig::default();
        assert_eq!(config.server, "127.0.0.1");
        assert_eq!(config.port, 8080);
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
    }
}

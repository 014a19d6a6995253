//! Data bridge — connects [`Session`] streams to TUI actions.
//!
//! Runs as a background task: subscribes to the session's event stream and
//! forwards every change as an [`Action`] through the TUI's action channel.

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use titlecast_core::{Session, SessionEvent};

use crate::action::Action;

/// Forward [`Session`] events into the TUI action loop until cancelled.
///
/// Pushes initial snapshots first so the screen has state immediately,
/// then loops over the live event stream. A lagged receiver re-seeds
/// from the same snapshots.
pub async fn run_data_bridge(
    session: Session,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    // Subscribe before reading the snapshots so no transition slips
    // through the gap between them.
    let mut events = session.subscribe();
    send_snapshots(&session, &action_tx);

    // Stream loop — forward every change until cancelled
    loop {
        tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            event = events.recv() => match event {
                Ok(SessionEvent::Connection(state)) => {
                    let _ = action_tx.send(Action::ConnectionChanged(state));
                }
                Ok(SessionEvent::Capability(capability)) => {
                    let _ = action_tx.send(Action::CapabilityChanged(capability));
                }
                Ok(SessionEvent::Broadcasts { entries, summary }) => {
                    debug!(count = entries.len(), ?summary, "dispatching BroadcastsUpdated");
                    let _ = action_tx.send(Action::BroadcastsUpdated { entries });
                }
                Ok(SessionEvent::Cleared) => {
                    let _ = action_tx.send(Action::BroadcastsCleared);
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "session event stream lagged; resyncing");
                    send_snapshots(&session, &action_tx);
                }
                Err(RecvError::Closed) => break,
            },
        }
    }

    debug!("data bridge shut down");
}

/// Push the session's current state as actions: connection, capability,
/// and the broadcast list. A skipped event would otherwise leave the
/// screen stale, so an empty list is sent as a clear rather than elided.
fn send_snapshots(session: &Session, action_tx: &mpsc::UnboundedSender<Action>) {
    let _ = action_tx.send(Action::ConnectionChanged(session.current_connection()));
    let _ = action_tx.send(Action::CapabilityChanged(session.capability()));
    let entries = session.broadcasts();
    if entries.is_empty() {
        let _ = action_tx.send(Action::BroadcastsCleared);
    } else {
        let _ = action_tx.send(Action::BroadcastsUpdated { entries });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use titlecast_core::{CapabilityState, SessionConfig};

    use super::*;

    #[tokio::test]
    async fn a_resync_covers_every_screen_input() {
        // Nothing listens on the port; the session idles in its retry
        // loop with empty, manifest-unavailable state.
        let cancel = CancellationToken::new();
        let config = SessionConfig::new("127.0.0.1", 9);
        let session = Session::connect(config, None, cancel.clone()).unwrap();
        let (action_tx, mut action_rx) = mpsc::unbounded_channel();

        send_snapshots(&session, &action_tx);

        assert!(matches!(
            action_rx.try_recv(),
            Ok(Action::ConnectionChanged(_))
        ));
        assert!(matches!(
            action_rx.try_recv(),
            Ok(Action::CapabilityChanged(
                CapabilityState::ManifestUnavailable
            ))
        ));
        // The empty list arrives as a clear, not an empty update.
        assert!(matches!(action_rx.try_recv(), Ok(Action::BroadcastsCleared)));
        assert!(action_rx.try_recv().is_err());

        cancel.cancel();
    }
}

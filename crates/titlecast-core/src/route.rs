// ── Inbound message classification ──
//
// Every inbound envelope is reduced to one `RemoteEvent` before the
// session acts on it. Each subscribed `{source, type}` pair has its own
// arm and its own variant: no arm falls through into another, so adding
// a handler for one event can never change the behavior of its
// neighbors. Anything unrecognized or unparsable classifies as
// `Ignored`.

use tracing::debug;

use titlecast_api::protocol::{self, ActionDescriptor, ServerMessage};

use crate::command;
use crate::model::{Broadcast, SnapshotPayload};

/// What an inbound envelope means to the session.
#[derive(Debug, Clone)]
pub enum RemoteEvent {
    /// Reply to the action-catalog query; feeds the capability check.
    Catalog(Vec<ActionDescriptor>),
    /// Twitch stream settings changed on the server side.
    TwitchStreamUpdate,
    /// A YouTube broadcast went live.
    YouTubeBroadcastStarted,
    /// A YouTube broadcast ended.
    YouTubeBroadcastEnded,
    /// A YouTube broadcast's settings changed.
    YouTubeBroadcastUpdated,
    /// Fresh broadcast snapshot pushed by the fetch action.
    Snapshot(Vec<Broadcast>),
    /// Not addressed to us, or malformed. Dropped without side effects.
    Ignored,
}

impl RemoteEvent {
    /// True for platform events that should trigger a snapshot re-fetch.
    pub fn is_lifecycle_change(&self) -> bool {
        matches!(
            self,
            Self::TwitchStreamUpdate
                | Self::YouTubeBroadcastStarted
                | Self::YouTubeBroadcastEnded
                | Self::YouTubeBroadcastUpdated
        )
    }
}

/// Classify one inbound envelope.
pub fn classify(message: &ServerMessage) -> RemoteEvent {
    if message.is_catalog_reply() {
        return RemoteEvent::Catalog(message.actions.clone().unwrap_or_default());
    }

    let Some(event) = &message.event else {
        return RemoteEvent::Ignored;
    };

    match (event.source.as_str(), event.kind.as_str()) {
        (protocol::SOURCE_TWITCH, protocol::EVENT_STREAM_UPDATE) => RemoteEvent::TwitchStreamUpdate,
        (protocol::SOURCE_YOUTUBE, protocol::EVENT_BROADCAST_STARTED) => {
            RemoteEvent::YouTubeBroadcastStarted
        }
        (protocol::SOURCE_YOUTUBE, protocol::EVENT_BROADCAST_ENDED) => {
            RemoteEvent::YouTubeBroadcastEnded
        }
        (protocol::SOURCE_YOUTUBE, protocol::EVENT_BROADCAST_UPDATED) => {
            RemoteEvent::YouTubeBroadcastUpdated
        }
        (protocol::SOURCE_GENERAL, protocol::EVENT_CUSTOM) => classify_custom(&message.data),
        (source, kind) => {
            debug!(source, kind, "Ignoring unsubscribed event");
            RemoteEvent::Ignored
        }
    }
}

/// Custom events are a shared channel; only payloads stamped with the
/// fetch action's name are broadcast snapshots.
fn classify_custom(data: &serde_json::Value) -> RemoteEvent {
    let payload: SnapshotPayload = match serde_json::from_value(data.clone()) {
        Ok(payload) => payload,
        Err(e) => {
            debug!(error = %e, "Ignoring unparsable custom event payload");
            return RemoteEvent::Ignored;
        }
    };

    if payload.action.as_deref() == Some(command::FETCH_BROADCASTS) {
        RemoteEvent::Snapshot(payload.broadcast_list)
    } else {
        RemoteEvent::Ignored
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(value: serde_json::Value) -> ServerMessage {
        serde_json::from_value(value).unwrap()
    }

    fn event(source: &str, kind: &str) -> ServerMessage {
        envelope(json!({
            "event": { "source": source, "type": kind },
            "data": {}
        }))
    }

    #[test]
    fn catalog_reply_is_recognized_by_request_id() {
        let message = envelope(json!({
            "id": "GetActions",
            "status": "ok",
            "actions": [{ "id": "a1", "name": "Titlecast | Fetch Broadcasts" }],
            "count": 1
        }));
        match classify(&message) {
            RemoteEvent::Catalog(actions) => {
                assert_eq!(actions.len(), 1);
                assert_eq!(actions[0].name, "Titlecast | Fetch Broadcasts");
            }
            other => panic!("expected Catalog, got {other:?}"),
        }
    }

    #[test]
    fn each_subscribed_pair_maps_to_its_own_variant() {
        assert!(matches!(
            classify(&event("Twitch", "StreamUpdate")),
            RemoteEvent::TwitchStreamUpdate
        ));
        assert!(matches!(
            classify(&event("YouTube", "BroadcastStarted")),
            RemoteEvent::YouTubeBroadcastStarted
        ));
        assert!(matches!(
            classify(&event("YouTube", "BroadcastEnded")),
            RemoteEvent::YouTubeBroadcastEnded
        ));
        assert!(matches!(
            classify(&event("YouTube", "BroadcastUpdated")),
            RemoteEvent::YouTubeBroadcastUpdated
        ));
    }

    #[test]
    fn lifecycle_predicate_covers_exactly_the_refetch_triggers() {
        assert!(classify(&event("Twitch", "StreamUpdate")).is_lifecycle_change());
        assert!(classify(&event("YouTube", "BroadcastEnded")).is_lifecycle_change());
        assert!(!RemoteEvent::Ignored.is_lifecycle_change());
        assert!(!RemoteEvent::Snapshot(Vec::new()).is_lifecycle_change());
    }

    #[test]
    fn source_and_type_must_both_match() {
        // A known type under the wrong source must not dispatch.
        assert!(matches!(
            classify(&event("Twitch", "BroadcastStarted")),
            RemoteEvent::Ignored
        ));
        assert!(matches!(
            classify(&event("YouTube", "StreamUpdate")),
            RemoteEvent::Ignored
        ));
        assert!(matches!(
            classify(&event("Obs", "SceneChanged")),
            RemoteEvent::Ignored
        ));
    }

    #[test]
    fn snapshot_requires_the_fetch_action_stamp() {
        let message = envelope(json!({
            "event": { "source": "General", "type": "Custom" },
            "data": {
                "action": "Titlecast | Fetch Broadcasts",
                "broadcastList": [
                    { "id": "t1", "platform": "twitch", "title": "A", "url": "u" }
                ]
            }
        }));
        match classify(&message) {
            RemoteEvent::Snapshot(broadcasts) => assert_eq!(broadcasts[0].id, "t1"),
            other => panic!("expected Snapshot, got {other:?}"),
        }
    }

    #[test]
    fn foreign_custom_events_are_ignored() {
        let message = envelope(json!({
            "event": { "source": "General", "type": "Custom" },
            "data": { "action": "Some Other Integration", "payload": 7 }
        }));
        assert!(matches!(classify(&message), RemoteEvent::Ignored));
    }

    #[test]
    fn malformed_snapshot_payloads_are_ignored() {
        let message = envelope(json!({
            "event": { "source": "General", "type": "Custom" },
            "data": {
                "action": "Titlecast | Fetch Broadcasts",
                "broadcastList": [{ "id": "x", "platform": "vimeo", "title": "A" }]
            }
        }));
        assert!(matches!(classify(&message), RemoteEvent::Ignored));
    }

    #[test]
    fn envelopes_without_id_or_event_are_ignored() {
        let message = envelope(json!({ "data": {} }));
        assert!(matches!(classify(&message), RemoteEvent::Ignored));
    }
}

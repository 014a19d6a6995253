//! Wire types for the automation server's WebSocket protocol.
//!
//! The server speaks a small JSON request/response/event protocol:
//! clients send request envelopes (`Subscribe`, `GetActions`, `DoAction`)
//! and receive either correlated replies (matched by request `id`) or
//! subscribed events (matched by `event.source` / `event.type`).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Well-known identifiers ───────────────────────────────────────────

/// Fixed request id for the action-catalog query. The reply carries the
/// same id back, so it can be correlated without tracking pending requests.
pub const GET_ACTIONS_ID: &str = "GetActions";

/// Fixed request id for the event subscription. The subscription has no
/// interesting reply; the id only aids server-side log correlation.
pub const SUBSCRIBE_ID: &str = "subscribe-events-id";

// ── Event sources and types ──────────────────────────────────────────

pub const SOURCE_TWITCH: &str = "Twitch";
pub const SOURCE_YOUTUBE: &str = "YouTube";
pub const SOURCE_GENERAL: &str = "General";

pub const EVENT_STREAM_UPDATE: &str = "StreamUpdate";
pub const EVENT_BROADCAST_STARTED: &str = "BroadcastStarted";
pub const EVENT_BROADCAST_ENDED: &str = "BroadcastEnded";
pub const EVENT_BROADCAST_UPDATED: &str = "BroadcastUpdated";
pub const EVENT_CUSTOM: &str = "Custom";

// ── Outbound requests ────────────────────────────────────────────────

/// The three request verbs the server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestName {
    Subscribe,
    GetActions,
    DoAction,
}

/// Reference to a named server-side action inside a `DoAction` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRef {
    pub name: String,
}

/// Event categories a `Subscribe` request enrolls in.
///
/// Key casing is part of the wire format: the YouTube category is spelled
/// `youTube` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSubscription {
    pub twitch: Vec<String>,
    #[serde(rename = "youTube")]
    pub you_tube: Vec<String>,
    pub general: Vec<String>,
}

impl EventSubscription {
    /// The fixed category enumeration this client subscribes to:
    /// Twitch stream updates, YouTube broadcast lifecycle, and the
    /// general custom-event channel that carries broadcast snapshots.
    pub fn broadcast_lifecycle() -> Self {
        Self {
            twitch: vec![EVENT_STREAM_UPDATE.to_string()],
            you_tube: vec![
                EVENT_BROADCAST_STARTED.to_string(),
                EVENT_BROADCAST_ENDED.to_string(),
                EVENT_BROADCAST_UPDATED.to_string(),
            ],
            general: vec![EVENT_CUSTOM.to_string()],
        }
    }
}

/// Outbound request envelope.
///
/// Only the fields a given verb needs are present on the wire; the rest
/// are skipped during serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub request: RequestName,
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events: Option<EventSubscription>,
}

impl Request {
    /// Subscription request for the fixed event categories.
    pub fn subscribe() -> Self {
        Self {
            request: RequestName::Subscribe,
            id: SUBSCRIBE_ID.to_string(),
            action: None,
            args: None,
            events: Some(EventSubscription::broadcast_lifecycle()),
        }
    }

    /// Action-catalog query, correlated by the fixed [`GET_ACTIONS_ID`].
    pub fn get_actions() -> Self {
        Self {
            request: RequestName::GetActions,
            id: GET_ACTIONS_ID.to_string(),
            action: None,
            args: None,
            events: None,
        }
    }

    /// Fire-and-forget invocation of a named action, no arguments.
    ///
    /// Every `DoAction` carries a fresh UUID v4 id. Nothing correlates the
    /// reply; effects are observed through the event stream.
    pub fn do_action(name: &str) -> Self {
        Self {
            request: RequestName::DoAction,
            id: Uuid::new_v4().to_string(),
            action: Some(ActionRef {
                name: name.to_string(),
            }),
            args: None,
            events: None,
        }
    }

    /// Fire-and-forget invocation of a named action with arguments.
    pub fn do_action_with_args(
        name: &str,
        args: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            args: Some(args),
            ..Self::do_action(name)
        }
    }
}

// ── Inbound messages ─────────────────────────────────────────────────

/// `source`/`type` pair identifying a subscribed event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventKey {
    pub source: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// One entry of the action catalog returned for a `GetActions` query.
///
/// Uses `#[serde(flatten)]` to capture all fields beyond the core set,
/// so nothing from the server is silently dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Inbound message envelope.
///
/// Replies carry the originating request `id`; subscribed events carry an
/// [`EventKey`] instead. Everything else varies by message and lives in
/// `data` / `actions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerMessage {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub event: Option<EventKey>,
    #[serde(default)]
    pub data: serde_json::Value,
    #[serde(default)]
    pub actions: Option<Vec<ActionDescriptor>>,
    #[serde(default)]
    pub count: Option<u64>,
}

impl ServerMessage {
    /// Whether this is the reply to the action-catalog query.
    pub fn is_catalog_reply(&self) -> bool {
        self.id.as_deref() == Some(GET_ACTIONS_ID)
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn subscribe_wire_shape() {
        let value = serde_json::to_value(Request::subscribe()).unwrap();
        assert_eq!(
            value,
            json!({
                "request": "Subscribe",
                "id": "subscribe-events-id",
                "events": {
                    "twitch": ["StreamUpdate"],
                    "youTube": ["BroadcastStarted", "BroadcastEnded", "BroadcastUpdated"],
                    "general": ["Custom"]
                }
            })
        );
    }

    #[test]
    fn get_actions_wire_shape() {
        let value = serde_json::to_value(Request::get_actions()).unwrap();
        assert_eq!(value, json!({ "request": "GetActions", "id": "GetActions" }));
    }

    #[test]
    fn do_action_carries_fresh_uuid() {
        let a = Request::do_action("Some Action");
        let b = Request::do_action("Some Action");

        assert_ne!(a.id, b.id);
        assert!(Uuid::parse_str(&a.id).is_ok());
        assert!(Uuid::parse_str(&b.id).is_ok());
    }

    #[test]
    fn do_action_with_args_wire_shape() {
        let mut args = serde_json::Map::new();
        args.insert("title".into(), json!("New stream title"));

        let value = serde_json::to_value(Request::do_action_with_args("Update", args)).unwrap();

        assert_eq!(value["request"], "DoAction");
        assert_eq!(value["action"]["name"], "Update");
        assert_eq!(value["args"]["title"], "New stream title");
        // No subscription payload on a DoAction
        assert!(value.get("events").is_none());
    }

    #[test]
    fn do_action_without_args_omits_args_key() {
        let value = serde_json::to_value(Request::do_action("Fetch")).unwrap();
        assert!(value.get("args").is_none());
    }

    #[test]
    fn deserialize_catalog_reply() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "status": "ok",
            "id": "GetActions",
            "actions": [
                { "id": "a1", "name": "First Action", "group": "Setup", "enabled": true },
                { "name": "Second Action", "subaction_count": 3 }
            ],
            "count": 2
        }))
        .unwrap();

        assert!(msg.is_catalog_reply());
        assert_eq!(msg.count, Some(2));

        let actions = msg.actions.unwrap();
        assert_eq!(actions[0].name, "First Action");
        assert_eq!(actions[0].enabled, Some(true));
        assert_eq!(actions[1].name, "Second Action");
        // Unknown fields land in `extra`
        assert_eq!(actions[1].extra["subaction_count"], 3);
    }

    #[test]
    fn deserialize_event_envelope() {
        let msg: ServerMessage = serde_json::from_value(json!({
            "event": { "source": "Twitch", "type": "StreamUpdate" },
            "data": { "channel": "somebody" }
        }))
        .unwrap();

        assert!(!msg.is_catalog_reply());
        let event = msg.event.unwrap();
        assert_eq!(event.source, SOURCE_TWITCH);
        assert_eq!(event.kind, EVENT_STREAM_UPDATE);
        assert_eq!(msg.data["channel"], "somebody");
    }

    #[test]
    fn deserialize_minimal_envelope() {
        let msg: ServerMessage = serde_json::from_value(json!({})).unwrap();

        assert!(msg.id.is_none());
        assert!(msg.event.is_none());
        assert!(msg.data.is_null());
        assert!(msg.actions.is_none());
    }

    #[test]
    fn subscription_round_trips() {
        let text = serde_json::to_string(&Request::subscribe()).unwrap();
        let parsed: Request = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, Request::subscribe());
    }
}

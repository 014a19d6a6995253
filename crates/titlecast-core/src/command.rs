// ── Outbound command builders ──
//
// Every mutation the client performs is a `DoAction` naming one of the
// four server-side actions below. Dispatch is fire-and-forget: the server
// answers through events, not through request/reply pairing, so nothing
// here waits on a response.

use serde_json::{Map, Value};

use titlecast_api::protocol::Request;

use crate::model::Broadcast;

// Server-side action names. These must match the automation server's
// configured actions character for character; the capability check in
// `capability` verifies that at connect time.
pub const FETCH_BROADCASTS: &str = "Titlecast | Fetch Broadcasts";
pub const UPDATE_ALL_BROADCASTS: &str = "Titlecast | Update All Broadcasts";
pub const UPDATE_TWITCH_TITLE: &str = "Titlecast | Update Twitch Title";
pub const UPDATE_YOUTUBE_TITLE: &str = "Titlecast | Update YouTube Title";

/// Ask the server to push a fresh broadcast snapshot.
///
/// The reply arrives later as a custom event whose payload names
/// [`FETCH_BROADCASTS`]; nothing is returned on the request id.
pub fn fetch_broadcasts() -> Request {
    Request::do_action(FETCH_BROADCASTS)
}

/// Apply one title across every platform in a single server-side action.
pub fn update_all_titles(title: &str) -> Request {
    let mut args = Map::new();
    args.insert("title".into(), Value::String(title.to_owned()));
    Request::do_action_with_args(UPDATE_ALL_BROADCASTS, args)
}

/// Retitle a single broadcast on its own platform.
///
/// Twitch has one stream, so its action takes only the title. YouTube can
/// run several broadcasts at once and needs the platform-native id as
/// `broadcastId`.
pub fn update_platform_title(broadcast: &Broadcast, title: &str) -> Request {
    let mut args = Map::new();
    args.insert("title".into(), Value::String(title.to_owned()));
    if broadcast.platform.is_youtube() {
        args.insert(
            "broadcastId".into(),
            Value::String(broadcast.platform_id().to_owned()),
        );
    }
    Request::do_action_with_args(broadcast.platform.update_action(), args)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use crate::model::Platform;

    fn twitch_broadcast() -> Broadcast {
        Broadcast {
            id: "twitch-main".into(),
            platform: Platform::Twitch,
            title: "Old title".into(),
            url: "https://twitch.tv/someone".into(),
        }
    }

    fn youtube_broadcast() -> Broadcast {
        Broadcast {
            id: "youtube-abc123".into(),
            platform: Platform::YouTube,
            title: "Old title".into(),
            url: "https://youtube.com/watch?v=abc123".into(),
        }
    }

    #[test]
    fn fetch_names_the_action_and_carries_no_args() {
        let wire = serde_json::to_value(fetch_broadcasts()).unwrap();
        assert_eq!(wire["action"]["name"], json!(FETCH_BROADCASTS));
        assert!(wire.get("args").is_none());
    }

    #[test]
    fn update_all_carries_only_the_title() {
        let wire = serde_json::to_value(update_all_titles("New title")).unwrap();
        assert_eq!(wire["action"]["name"], json!(UPDATE_ALL_BROADCASTS));
        assert_eq!(wire["args"], json!({ "title": "New title" }));
    }

    #[test]
    fn twitch_update_omits_the_broadcast_id() {
        let wire =
            serde_json::to_value(update_platform_title(&twitch_broadcast(), "New title")).unwrap();
        assert_eq!(wire["action"]["name"], json!(UPDATE_TWITCH_TITLE));
        assert_eq!(wire["args"], json!({ "title": "New title" }));
    }

    #[test]
    fn youtube_update_sends_the_stripped_broadcast_id() {
        let wire =
            serde_json::to_value(update_platform_title(&youtube_broadcast(), "New title")).unwrap();
        assert_eq!(wire["action"]["name"], json!(UPDATE_YOUTUBE_TITLE));
        assert_eq!(
            wire["args"],
            json!({ "broadcastId": "abc123", "title": "New title" })
        );
    }

    #[test]
    fn each_dispatch_gets_a_distinct_request_id() {
        let first = serde_json::to_value(fetch_broadcasts()).unwrap();
        let second = serde_json::to_value(fetch_broadcasts()).unwrap();
        assert_ne!(first["id"], second["id"]);
    }
}

// ── Broadcast domain types ──

use serde::{Deserialize, Serialize};

/// Prefix the server prepends to YouTube broadcast ids so they cannot
/// collide with Twitch ids in one list.
pub const YOUTUBE_ID_PREFIX: &str = "youtube-";

/// Streaming platform a broadcast belongs to.
///
/// Serialized lowercase on the wire (`"twitch"` / `"youtube"`); displayed
/// with its proper name in UI contexts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Twitch,
    YouTube,
}

impl Platform {
    pub fn is_youtube(self) -> bool {
        matches!(self, Self::YouTube)
    }

    /// Name of the server-side action that retitles this platform.
    pub fn update_action(self) -> &'static str {
        match self {
            Self::Twitch => crate::command::UPDATE_TWITCH_TITLE,
            Self::YouTube => crate::command::UPDATE_YOUTUBE_TITLE,
        }
    }
}

/// One active broadcast as reported by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Broadcast {
    /// List-unique id; YouTube ids carry the [`YOUTUBE_ID_PREFIX`].
    pub id: String,
    pub platform: Platform,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
}

impl Broadcast {
    /// The platform-native id, i.e. the wire id minus any
    /// [`YOUTUBE_ID_PREFIX`]. This is what YouTube's update action expects
    /// as its `broadcastId` argument.
    pub fn platform_id(&self) -> &str {
        self.id.strip_prefix(YOUTUBE_ID_PREFIX).unwrap_or(&self.id)
    }
}

/// Payload of the server's custom event carrying a broadcast snapshot.
///
/// `action` names the server-side action that produced the payload, which
/// is how snapshot events are told apart from unrelated custom events.
#[derive(Debug, Clone, Deserialize)]
pub struct SnapshotPayload {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(rename = "broadcastList", default)]
    pub broadcast_list: Vec<Broadcast>,
}

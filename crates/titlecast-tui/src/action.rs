//! All possible UI actions. Actions are the sole mechanism for state mutation.

use titlecast_core::{Broadcast, CapabilityState, ConnectionState};

/// What a submitted title applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditTarget {
    /// Every live broadcast at once, through the server's update-all action.
    All,
    /// One broadcast, retitled on its own platform.
    One(Broadcast),
}

/// Notification severity level.
#[allow(dead_code)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

#[allow(dead_code)]
impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Every state transition in the TUI is expressed as an Action.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Session data (from the data bridge) ───────────────────────
    ConnectionChanged(ConnectionState),
    CapabilityChanged(CapabilityState),
    BroadcastsUpdated { entries: Vec<Broadcast> },
    BroadcastsCleared,

    // ── Broadcast commands ────────────────────────────────────────
    RequestRefresh,
    SubmitTitle { target: EditTarget, title: String },

    // ── Help ──────────────────────────────────────────────────────
    ToggleHelp,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
    DismissNotification,
}

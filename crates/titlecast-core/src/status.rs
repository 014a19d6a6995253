// ── Status presentation ──
//
// One pure function from session state to widget visibility. The UI layer
// renders whatever this says and keeps no policy of its own, so every
// show/hide rule in the client is testable right here.

use crate::capability::CapabilityState;

use titlecast_api::socket::ConnectionState;

/// Which status surfaces the UI should show. Plain data, no behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusView {
    /// Connection indicator: lit while the socket is up.
    pub online: bool,
    /// A connection attempt is in flight.
    pub connecting: bool,
    /// "Start the automation server" instructions.
    pub show_connect_help: bool,
    /// Missing-setup panel: required actions absent or manifest unloadable.
    pub show_setup_panel: bool,
    /// "Go live on YouTube" notice shown when no YouTube broadcast is up.
    pub show_youtube_notice: bool,
    /// Controls are usable (connected and capability-checked).
    pub controls_enabled: bool,
}

/// Map session state to widget visibility.
///
/// The setup panel tracks the capability verdict alone: a verdict earned
/// on one connection stays visible through a disconnect until the next
/// check replaces it.
pub fn present(
    connection: ConnectionState,
    capability: &CapabilityState,
    youtube_live: usize,
) -> StatusView {
    let online = connection.is_connected();
    let operational = online && capability.is_satisfied();
    StatusView {
        online,
        connecting: connection == ConnectionState::Connecting,
        show_connect_help: !online,
        show_setup_panel: capability.is_missing(),
        show_youtube_notice: operational && youtube_live == 0,
        controls_enabled: operational,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn disconnected_shows_help_and_disables_controls() {
        let view = present(ConnectionState::Disconnected, &CapabilityState::Unknown, 0);
        assert_eq!(
            view,
            StatusView {
                online: false,
                connecting: false,
                show_connect_help: true,
                show_setup_panel: false,
                show_youtube_notice: false,
                controls_enabled: false,
            }
        );
    }

    #[test]
    fn connected_and_satisfied_enables_controls() {
        let view = present(ConnectionState::Connected, &CapabilityState::Satisfied, 1);
        assert!(view.online);
        assert!(view.controls_enabled);
        assert!(!view.show_connect_help);
        assert!(!view.show_setup_panel);
        assert!(!view.show_youtube_notice);
    }

    #[test]
    fn youtube_notice_appears_only_when_operational_with_no_youtube_broadcast() {
        let operational = present(ConnectionState::Connected, &CapabilityState::Satisfied, 0);
        assert!(operational.show_youtube_notice);

        // Not shown while the capability check is unresolved or failed.
        let unchecked = present(ConnectionState::Connected, &CapabilityState::Unknown, 0);
        assert!(!unchecked.show_youtube_notice);

        // Not shown while disconnected, whatever the last verdict was.
        let offline = present(ConnectionState::Disconnected, &CapabilityState::Satisfied, 0);
        assert!(!offline.show_youtube_notice);
    }

    #[test]
    fn setup_panel_follows_the_capability_verdict_alone() {
        let missing = CapabilityState::Missing(vec!["Titlecast | Fetch Broadcasts".into()]);

        let connected = present(ConnectionState::Connected, &missing, 0);
        assert!(connected.show_setup_panel);
        assert!(!connected.controls_enabled);

        // The verdict survives a drop: both the panel and the connect help
        // show at once.
        let dropped = present(ConnectionState::Disconnected, &missing, 0);
        assert!(dropped.show_setup_panel);
        assert!(dropped.show_connect_help);
    }

    #[test]
    fn manifest_unavailable_pins_the_setup_panel() {
        let view = present(
            ConnectionState::Connected,
            &CapabilityState::ManifestUnavailable,
            0,
        );
        assert!(view.show_setup_panel);
        assert!(!view.controls_enabled);
        assert!(!view.show_youtube_notice);
    }

    #[test]
    fn connecting_is_reported_distinctly() {
        let view = present(ConnectionState::Connecting, &CapabilityState::Unknown, 0);
        assert!(view.connecting);
        assert!(!view.online);
        assert!(view.show_connect_help);
    }
}

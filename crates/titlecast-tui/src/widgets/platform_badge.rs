//! Platform badge — brand-colored dot and name for a broadcast's platform.

use ratatui::style::{Color, Style};
use ratatui::text::Span;

use titlecast_core::Platform;

use crate::theme;

/// Brand color for a platform.
pub fn platform_color(platform: Platform) -> Color {
    match platform {
        Platform::Twitch => theme::TWITCH_PURPLE,
        Platform::YouTube => theme::YOUTUBE_RED,
    }
}

/// Returns a styled `Span` with the platform's colored dot.
pub fn platform_dot(platform: Platform) -> Span<'static> {
    Span::styled("●", Style::default().fg(platform_color(platform)))
}

/// Returns a styled `Span` naming the platform in its brand color.
pub fn platform_span(platform: Platform) -> Span<'static> {
    Span::styled(
        platform.to_string(),
        Style::default().fg(platform_color(platform)),
    )
}

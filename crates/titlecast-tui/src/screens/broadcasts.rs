//! Broadcasts screen — live broadcast table with a title editing overlay.
//!
//! Owns all session-facing presentation. While the link is down it shows
//! connect help; while the capability check fails it shows the setup
//! panel; otherwise it renders the reconciled broadcast table.

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState};
use tokio::sync::mpsc::UnboundedSender;

use titlecast_core::{Broadcast, CapabilityState, ConnectionState, StatusView, present};

use crate::action::{Action, EditTarget, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::platform_badge;

/// How many 250ms ticks the post-apply pulse stays lit (two seconds).
const PULSE_TICKS: u8 = 8;

// ── Edit overlay state ───────────────────────────────────────────────

/// In-progress title edit. Initialized from the selected broadcast
/// (or the whole list for update-all).
#[derive(Debug)]
struct TitleEditState {
    target: EditTarget,
    title: String,
    error: Option<String>,
}

impl TitleEditState {
    fn for_all(prefill: &str) -> Self {
        Self {
            target: EditTarget::All,
            title: prefill.to_owned(),
            error: None,
        }
    }

    fn for_broadcast(broadcast: Broadcast) -> Self {
        Self {
            title: broadcast.title.clone(),
            target: EditTarget::One(broadcast),
            error: None,
        }
    }

    fn heading(&self) -> String {
        match &self.target {
            EditTarget::All => " Retitle All Broadcasts ".to_owned(),
            EditTarget::One(broadcast) => format!(" Retitle on {} ", broadcast.platform),
        }
    }

    /// Validate and convert to a dispatchable action. Returns the state
    /// back with an error set when the title is blank.
    fn submit(mut self) -> Result<Action, Self> {
        let trimmed = self.title.trim();
        if trimmed.is_empty() {
            self.error = Some("Title cannot be empty".into());
            return Err(self);
        }
        Ok(Action::SubmitTitle {
            target: self.target.clone(),
            title: trimmed.to_owned(),
        })
    }
}

// ── Main screen ──────────────────────────────────────────────────────

pub struct BroadcastsScreen {
    focused: bool,
    action_tx: Option<UnboundedSender<Action>>,
    connection: ConnectionState,
    capability: CapabilityState,
    broadcasts: Vec<Broadcast>,
    table_state: TableState,
    edit: Option<TitleEditState>,
    /// Remaining ticks on the refresh pulse lighting up the title column.
    pulse_ticks: u8,
    /// Endpoint shown in the connect help, e.g. `ws://127.0.0.1:8080`.
    endpoint: String,
    /// Setup instructions link shown on the setup panel.
    docs_url: String,
    throbber_state: throbber_widgets_tui::ThrobberState,
}

impl BroadcastsScreen {
    pub fn new(endpoint: String, docs_url: String) -> Self {
        Self {
            focused: false,
            action_tx: None,
            connection: ConnectionState::default(),
            capability: CapabilityState::default(),
            broadcasts: Vec::new(),
            table_state: TableState::default(),
            edit: None,
            pulse_ticks: 0,
            endpoint,
            docs_url,
            throbber_state: throbber_widgets_tui::ThrobberState::default(),
        }
    }

    fn status_view(&self) -> StatusView {
        let youtube_live = self
            .broadcasts
            .iter()
            .filter(|b| b.platform.is_youtube())
            .count();
        present(self.connection, &self.capability, youtube_live)
    }

    // ── Selection ────────────────────────────────────────────────────

    fn selected_index(&self) -> usize {
        self.table_state.selected().unwrap_or(0)
    }

    fn select(&mut self, idx: usize) {
        let clamped = if self.broadcasts.is_empty() {
            0
        } else {
            idx.min(self.broadcasts.len() - 1)
        };
        self.table_state.select(Some(clamped));
    }

    fn move_selection(&mut self, delta: isize) {
        if self.broadcasts.is_empty() {
            return;
        }
        #[allow(clippy::cast_possible_wrap)]
        let current = self.selected_index() as isize;
        #[allow(clippy::cast_possible_wrap)]
        let next = (current + delta).clamp(0, self.broadcasts.len() as isize - 1);
        self.select(next as usize);
    }

    fn selected_broadcast(&self) -> Option<&Broadcast> {
        self.broadcasts.get(self.selected_index())
    }

    // ── Data intake ──────────────────────────────────────────────────

    fn apply_broadcasts(&mut self, entries: &[Broadcast]) -> Option<Action> {
        self.broadcasts = entries.to_vec();
        if !self.broadcasts.is_empty() && self.selected_index() >= self.broadcasts.len() {
            self.select(self.broadcasts.len() - 1);
        }
        // Every applied snapshot pulses, even a no-change reapply: the
        // signal means "refreshed", not "different".
        self.pulse_ticks = PULSE_TICKS;

        // A per-broadcast edit whose target left the list has nothing to
        // retitle anymore.
        if let Some(TitleEditState {
            target: EditTarget::One(editing),
            ..
        }) = &self.edit
        {
            if !self.broadcasts.iter().any(|b| b.id == editing.id) {
                let platform = editing.platform;
                self.edit = None;
                return Some(Action::Notify(Notification::info(format!(
                    "{platform} broadcast went offline"
                ))));
            }
        }
        None
    }

    // ── Panels ───────────────────────────────────────────────────────

    #[allow(clippy::unused_self)]
    fn render_centered_panel(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        border: Style,
        height: u16,
    ) -> Rect {
        let panel_w = 58u16.min(area.width.saturating_sub(4));
        let panel_h = height.min(area.height.saturating_sub(2));
        let x = (area.width.saturating_sub(panel_w)) / 2;
        let y = (area.height.saturating_sub(panel_h)) / 2;
        let panel = Rect::new(area.x + x, area.y + y, panel_w, panel_h);

        frame.render_widget(
            Block::default().style(Style::default().bg(theme::BG_DARK)),
            panel,
        );

        let block = Block::default()
            .title(title.to_owned())
            .title_alignment(Alignment::Center)
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border);

        let inner = block.inner(panel);
        frame.render_widget(block, panel);
        inner
    }

    fn render_connect_help(&self, frame: &mut Frame, area: Rect, connecting: bool) {
        let inner =
            self.render_centered_panel(frame, area, " Not Connected ", theme::border_default(), 9);

        let layout = Layout::vertical([
            Constraint::Length(1), // spacer
            Constraint::Length(1), // state line
            Constraint::Length(1), // spacer
            Constraint::Min(1),    // help text
        ])
        .split(inner);

        if connecting {
            let throbber = throbber_widgets_tui::Throbber::default()
                .label(format!("  Connecting to {}", self.endpoint))
                .style(Style::default().fg(theme::ACCENT_CYAN))
                .throbber_style(Style::default().fg(theme::TWITCH_PURPLE));
            frame.render_stateful_widget(throbber, layout[1], &mut self.throbber_state.clone());
        } else {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    format!("  ○ Waiting for {}", self.endpoint),
                    Style::default().fg(theme::ERROR_RED),
                )),
                layout[1],
            );
        }

        let help = vec![
            Line::from(Span::styled(
                "  Start Streamer.bot and enable its WebSocket server",
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(Span::styled(
                "  (Servers/Clients → WebSocket Server → Start).",
                Style::default().fg(theme::DIM_WHITE),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "  Retrying every five seconds.",
                theme::key_hint(),
            )),
        ];
        frame.render_widget(Paragraph::new(help), layout[3]);
    }

    fn render_setup_panel(&self, frame: &mut Frame, area: Rect) {
        let missing: &[String] = match &self.capability {
            CapabilityState::Missing(names) => names,
            _ => &[],
        };
        #[allow(clippy::cast_possible_truncation)]
        let height = (10 + missing.len() as u16).min(24);

        let inner = self.render_centered_panel(
            frame,
            area,
            " Setup Required ",
            Style::default().fg(theme::AMBER),
            height,
        );

        let mut lines = vec![Line::from("")];
        if missing.is_empty() {
            // Manifest never loaded — the check can never run.
            lines.push(Line::from(Span::styled(
                "  The required-actions manifest could not be loaded.",
                Style::default().fg(theme::DIM_WHITE),
            )));
            lines.push(Line::from(Span::styled(
                "  Broadcast fetching stays disabled until it does.",
                Style::default().fg(theme::DIM_WHITE),
            )));
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Check the manifest path or URL, then restart.",
                Style::default().fg(theme::DIM_WHITE),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                format!("  Streamer.bot is missing {} required action(s):", missing.len()),
                Style::default().fg(theme::DIM_WHITE),
            )));
            lines.push(Line::from(""));
            for name in missing {
                lines.push(Line::from(vec![
                    Span::styled("    ✗ ", Style::default().fg(theme::ERROR_RED)),
                    Span::styled(name.clone(), Style::default().fg(theme::ERROR_RED)),
                ]));
            }
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "  Import the Titlecast actions into Streamer.bot, then",
                Style::default().fg(theme::DIM_WHITE),
            )));
            lines.push(Line::from(Span::styled(
                "  restart its WebSocket server to re-run the check.",
                Style::default().fg(theme::DIM_WHITE),
            )));
        }
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled("  Docs: ", theme::key_hint()),
            Span::styled(self.docs_url.clone(), Style::default().fg(theme::ACCENT_CYAN)),
        ]));

        frame.render_widget(Paragraph::new(lines), inner);
    }

    // ── Table ────────────────────────────────────────────────────────

    fn render_table(&self, frame: &mut Frame, area: Rect, view: StatusView) {
        let count = self.broadcasts.len();
        let block = Block::default()
            .title(format!(" Broadcasts ({count}) "))
            .title_style(theme::title_style())
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(if self.focused {
                theme::border_focused()
            } else {
                theme::border_default()
            });

        let inner = block.inner(area);
        frame.render_widget(block, area);

        let mut constraints = vec![Constraint::Min(1)]; // table
        if view.show_youtube_notice {
            constraints.push(Constraint::Length(1));
        }
        constraints.push(Constraint::Length(1)); // hints
        let layout = Layout::vertical(constraints).split(inner);

        if self.broadcasts.is_empty() {
            frame.render_widget(
                Paragraph::new(Span::styled(
                    "No live broadcasts — press r to refresh",
                    Style::default().fg(theme::BORDER_GRAY),
                ))
                .alignment(Alignment::Center),
                layout[0],
            );
        } else {
            self.render_rows(frame, layout[0]);
        }

        let mut next = 1;
        if view.show_youtube_notice {
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("  ▶ ", Style::default().fg(theme::YOUTUBE_RED)),
                    Span::styled(
                        "No YouTube broadcast is live — go live on YouTube to manage it here",
                        Style::default().fg(theme::AMBER),
                    ),
                ])),
                layout[next],
            );
            next += 1;
        }

        let hints = Line::from(vec![
            Span::styled("  j/k ", theme::key_hint_key()),
            Span::styled("navigate  ", theme::key_hint()),
            Span::styled("Enter ", theme::key_hint_key()),
            Span::styled("retitle  ", theme::key_hint()),
            Span::styled("a ", theme::key_hint_key()),
            Span::styled("retitle all  ", theme::key_hint()),
            Span::styled("r ", theme::key_hint_key()),
            Span::styled("refresh", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[next]);
    }

    fn render_rows(&self, frame: &mut Frame, area: Rect) {
        let header = Row::new(vec![
            Cell::from(" "),
            Cell::from("Platform").style(theme::table_header()),
            Cell::from("Title").style(theme::table_header()),
            Cell::from("Link").style(theme::table_header()),
        ]);

        let selected_idx = self.selected_index();
        let title_style = if self.pulse_ticks > 0 {
            theme::pulse_highlight()
        } else {
            Style::default().fg(theme::DIM_WHITE)
        };

        let rows: Vec<Row> = self
            .broadcasts
            .iter()
            .enumerate()
            .map(|(i, broadcast)| {
                let is_selected = i == selected_idx;
                let prefix = if is_selected { "▸" } else { " " };

                let row_style = if is_selected {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };

                Row::new(vec![
                    Cell::from(Line::from(vec![
                        Span::raw(prefix.to_owned()),
                        platform_badge::platform_dot(broadcast.platform),
                    ])),
                    Cell::from(platform_badge::platform_span(broadcast.platform)),
                    Cell::from(broadcast.title.clone()).style(title_style),
                    Cell::from(broadcast.url.clone())
                        .style(Style::default().fg(theme::BORDER_GRAY)),
                ])
                .style(row_style)
            })
            .collect();

        let widths = [
            Constraint::Length(2),
            Constraint::Length(9),
            Constraint::Min(28),
            Constraint::Min(20),
        ];

        let table = Table::new(rows, widths)
            .header(header)
            .row_highlight_style(theme::table_selected());

        let mut state = self.table_state;
        frame.render_stateful_widget(table, area, &mut state);
    }

    // ── Edit overlay ─────────────────────────────────────────────────

    #[allow(clippy::unused_self)]
    fn render_edit_overlay(&self, frame: &mut Frame, area: Rect, edit: &TitleEditState) {
        let overlay_w = 56u16.min(area.width.saturating_sub(4));
        let overlay_h = 9u16.min(area.height.saturating_sub(2));
        let x = area.x + (area.width.saturating_sub(overlay_w)) / 2;
        let y = area.y + (area.height.saturating_sub(overlay_h)) / 2;
        let overlay_area = Rect::new(x, y, overlay_w, overlay_h);

        frame.render_widget(Clear, overlay_area);

        let block = Block::default()
            .title(edit.heading())
            .title_style(Style::default().fg(theme::AMBER))
            .borders(Borders::ALL)
            .border_type(BorderType::Double)
            .border_style(Style::default().fg(theme::TWITCH_PURPLE));

        let inner = block.inner(overlay_area);
        frame.render_widget(block, overlay_area);

        let layout = Layout::vertical([
            Constraint::Length(1), // context line
            Constraint::Length(3), // input box
            Constraint::Length(1), // error
            Constraint::Length(1), // hints
            Constraint::Min(0),
        ])
        .split(inner);

        let context = match &edit.target {
            EditTarget::All => Line::from(Span::styled(
                "  One title for every live broadcast",
                theme::key_hint(),
            )),
            EditTarget::One(broadcast) => Line::from(vec![
                Span::raw("  "),
                platform_badge::platform_dot(broadcast.platform),
                Span::styled(
                    format!(" {}", broadcast.platform_id()),
                    theme::key_hint(),
                ),
            ]),
        };
        frame.render_widget(Paragraph::new(context), layout[0]);

        let input_block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(theme::TWITCH_PURPLE));
        let input_area = layout[1];
        let input_inner = input_block.inner(input_area);
        frame.render_widget(input_block, input_area);
        frame.render_widget(
            Paragraph::new(Span::styled(
                format!("{}█", edit.title),
                Style::default().fg(theme::ACCENT_CYAN),
            )),
            input_inner,
        );

        if let Some(ref err) = edit.error {
            frame.render_widget(
                Paragraph::new(Span::styled(err, Style::default().fg(theme::ERROR_RED)))
                    .alignment(Alignment::Center),
                layout[2],
            );
        }

        let hints = Line::from(vec![
            Span::styled("  Enter ", theme::key_hint_key()),
            Span::styled("apply  ", theme::key_hint()),
            Span::styled("Esc ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]);
        frame.render_widget(Paragraph::new(hints), layout[3]);
    }
}

// ── Component impl ───────────────────────────────────────────────────

impl Component for BroadcastsScreen {
    fn init(&mut self, action_tx: UnboundedSender<Action>) -> Result<()> {
        self.action_tx = Some(action_tx);
        Ok(())
    }

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        // ── Edit overlay input ──────────────────────────────────
        if self.edit.is_some() {
            match key.code {
                KeyCode::Esc => {
                    self.edit = None;
                }
                KeyCode::Enter => {
                    if let Some(edit) = self.edit.take() {
                        match edit.submit() {
                            Ok(action) => return Ok(Some(action)),
                            Err(rejected) => self.edit = Some(rejected),
                        }
                    }
                }
                KeyCode::Backspace => {
                    if let Some(ref mut edit) = self.edit {
                        edit.title.pop();
                        edit.error = None;
                    }
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    if let Some(ref mut edit) = self.edit {
                        edit.title.push(c);
                        edit.error = None;
                    }
                }
                _ => {}
            }
            return Ok(None);
        }

        let view = self.status_view();

        // ── Normal navigation ───────────────────────────────────
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                Ok(None)
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                Ok(None)
            }
            KeyCode::Char('g') => {
                self.select(0);
                Ok(None)
            }
            KeyCode::Char('G') => {
                if !self.broadcasts.is_empty() {
                    self.select(self.broadcasts.len() - 1);
                }
                Ok(None)
            }
            KeyCode::Char('r') if view.controls_enabled => Ok(Some(Action::RequestRefresh)),
            KeyCode::Enter | KeyCode::Char('e') if view.controls_enabled => {
                if let Some(broadcast) = self.selected_broadcast().cloned() {
                    self.edit = Some(TitleEditState::for_broadcast(broadcast));
                }
                Ok(None)
            }
            KeyCode::Char('a') if view.controls_enabled => {
                let prefill = self
                    .selected_broadcast()
                    .map(|b| b.title.clone())
                    .unwrap_or_default();
                self.edit = Some(TitleEditState::for_all(&prefill));
                Ok(None)
            }
            _ => Ok(None),
        }
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ConnectionChanged(state) => {
                self.connection = *state;
            }
            Action::CapabilityChanged(capability) => {
                self.capability = capability.clone();
            }
            Action::BroadcastsUpdated { entries } => {
                return Ok(self.apply_broadcasts(entries));
            }
            Action::BroadcastsCleared => {
                self.broadcasts.clear();
                self.table_state.select(None);
                self.edit = None;
                self.pulse_ticks = 0;
            }
            Action::Tick => {
                self.pulse_ticks = self.pulse_ticks.saturating_sub(1);
                if self.connection == ConnectionState::Connecting {
                    self.throbber_state.calc_next();
                }
            }
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let view = self.status_view();

        if view.show_connect_help {
            self.render_connect_help(frame, area, view.connecting);
            return;
        }
        if view.show_setup_panel {
            self.render_setup_panel(frame, area);
            return;
        }

        self.render_table(frame, area, view);

        if let Some(ref edit) = self.edit {
            self.render_edit_overlay(frame, area, edit);
        }
    }

    fn capturing_input(&self) -> bool {
        self.edit.is_some()
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn id(&self) -> &'static str {
        "broadcasts"
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use titlecast_core::Platform;

    use super::*;

    fn broadcast(id: &str, platform: Platform, title: &str) -> Broadcast {
        Broadcast {
            id: id.to_owned(),
            platform,
            title: title.to_owned(),
            url: String::new(),
        }
    }

    fn screen() -> BroadcastsScreen {
        BroadcastsScreen::new(
            "ws://127.0.0.1:8080".to_owned(),
            "https://example.dev/setup".to_owned(),
        )
    }

    #[test]
    fn blank_titles_are_rejected_before_dispatch() {
        let edit = TitleEditState::for_all("   ");
        let rejected = edit.submit().unwrap_err();
        assert_eq!(rejected.error.as_deref(), Some("Title cannot be empty"));
    }

    #[test]
    fn submitted_titles_are_trimmed() {
        let edit = TitleEditState::for_all("  Launch Day!  ");
        let action = edit.submit().unwrap();
        match action {
            Action::SubmitTitle { target, title } => {
                assert_eq!(target, EditTarget::All);
                assert_eq!(title, "Launch Day!");
            }
            other => panic!("unexpected action: {other:?}"),
        }
    }

    #[test]
    fn per_broadcast_edit_prefills_the_current_title() {
        let edit =
            TitleEditState::for_broadcast(broadcast("youtube-b1", Platform::YouTube, "Old"));
        assert_eq!(edit.title, "Old");
        assert_eq!(edit.heading(), " Retitle on YouTube ");
    }

    #[test]
    fn selection_clamps_when_the_list_shrinks() {
        let mut screen = screen();
        let full = vec![
            broadcast("t1", Platform::Twitch, "A"),
            broadcast("youtube-b1", Platform::YouTube, "B"),
            broadcast("youtube-b2", Platform::YouTube, "C"),
        ];
        screen.apply_broadcasts(&full);
        screen.select(2);

        screen.apply_broadcasts(&full[..1]);
        assert_eq!(screen.selected_index(), 0);
    }

    #[test]
    fn every_applied_snapshot_restarts_the_pulse() {
        let mut screen = screen();
        let entries = [broadcast("t1", Platform::Twitch, "A")];
        screen.apply_broadcasts(&entries);
        assert_eq!(screen.pulse_ticks, PULSE_TICKS);

        for _ in 0..PULSE_TICKS {
            screen.update(&Action::Tick).unwrap();
        }
        assert_eq!(screen.pulse_ticks, 0);

        // A no-change reapply still signals that a refresh happened.
        screen.apply_broadcasts(&entries);
        assert_eq!(screen.pulse_ticks, PULSE_TICKS);
    }

    #[test]
    fn an_edit_closes_when_its_broadcast_goes_offline() {
        let mut screen = screen();
        let entries = vec![
            broadcast("t1", Platform::Twitch, "A"),
            broadcast("youtube-b1", Platform::YouTube, "B"),
        ];
        screen.apply_broadcasts(&entries);
        screen.edit = Some(TitleEditState::for_broadcast(entries[1].clone()));

        let follow_up = screen.apply_broadcasts(&entries[..1]);
        assert!(screen.edit.is_none());
        assert!(matches!(follow_up, Some(Action::Notify(_))));
    }

    #[test]
    fn clearing_resets_list_edit_and_pulse() {
        let mut screen = screen();
        let entries = vec![broadcast("t1", Platform::Twitch, "A")];
        screen
            .update(&Action::BroadcastsUpdated {
                entries: entries.clone(),
            })
            .unwrap();
        screen.edit = Some(TitleEditState::for_all("x"));

        screen.update(&Action::BroadcastsCleared).unwrap();

        assert!(screen.broadcasts.is_empty());
        assert!(screen.edit.is_none());
        assert_eq!(screen.pulse_ticks, 0);
    }
}

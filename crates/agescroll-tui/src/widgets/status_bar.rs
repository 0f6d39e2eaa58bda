use agescroll_core::SyncState;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::{App, Mode};

pub struct StatusBarWidget;

impl StatusBarWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;

        let mode_str = match app.mode {
            Mode::Normal => "NORMAL",
            Mode::Help => "HELP",
        };

        let state_color = match app.sync.state() {
            SyncState::Subscribed => theme.success,
            SyncState::Ready => theme.warning,
            SyncState::Idle | SyncState::Disposed => theme.grey1,
        };

        let refreshed = app
            .last_refresh
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "never".to_string());

        let status_text = if let Some(msg) = &app.status_message {
            format!(" {} ", msg)
        } else {
            format!(
                " {} | Photos: {} | Refreshed: {} ",
                mode_str,
                app.sync.catalog().len(),
                refreshed
            )
        };

        let state_text = format!(" {} ", app.sync.state());
        let help_hint = " q:quit j/k:scroll gg/G:ends enter:pinned r:refresh ?:help ";
        let used = state_text.chars().count() + status_text.chars().count() + help_hint.len();
        let padding_len = (area.width as usize).saturating_sub(used);

        let line = Line::from(vec![
            Span::styled(state_text, Style::default().fg(theme.bg0).bg(state_color)),
            Span::styled(status_text, Style::default().fg(theme.fg0).bg(theme.bg2)),
            Span::styled(" ".repeat(padding_len), Style::default().bg(theme.bg2)),
            Span::styled(help_hint, Style::default().fg(theme.grey1).bg(theme.bg2)),
        ]);

        let paragraph = Paragraph::new(line);
        frame.render_widget(paragraph, area);
    }
}

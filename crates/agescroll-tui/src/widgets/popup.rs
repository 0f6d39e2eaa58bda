use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::theme::Theme;

const KEY_HELP: &[(&str, &str)] = &[
    ("j / k", "scroll one line"),
    ("Ctrl-d / Ctrl-u", "half page down / up"),
    ("Ctrl-f / Ctrl-b", "page down / up"),
    ("gg / G", "first / last event"),
    ("Enter", "jump to the pinned photo"),
    ("r", "refresh photos"),
    ("q", "quit"),
];

pub struct PopupWidget;

impl PopupWidget {
    /// Render the key binding overlay
    pub fn render_help(frame: &mut Frame, theme: &Theme) {
        let area = frame.area();

        let popup_width = 46u16.min(area.width.saturating_sub(4));
        let popup_height = (KEY_HELP.len() as u16 + 4).min(area.height.saturating_sub(2));
        let popup_area = centered_rect(popup_width, popup_height, area);

        // Clear the background area
        frame.render_widget(Clear, popup_area);

        let block = Block::default()
            .title(" Keys ")
            .title_alignment(Alignment::Center)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.bg1));
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let mut lines: Vec<Line> = KEY_HELP
            .iter()
            .map(|(key, what)| {
                Line::from(vec![
                    Span::styled(
                        format!("{:>16}  ", key),
                        Style::default()
                            .fg(theme.aqua)
                            .add_modifier(Modifier::BOLD),
                    ),
                    Span::styled(*what, Style::default().fg(theme.fg0)),
                ])
            })
            .collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            "press any key to close",
            Style::default().fg(theme.grey1),
        )));

        frame.render_widget(Paragraph::new(lines), inner);
    }
}

/// Helper function to create a centered rect
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

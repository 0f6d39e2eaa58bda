use std::time::Instant;

use agescroll_core::sync::RevealStyle;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::layout::CardLayout;

pub struct TimelineWidget;

impl TimelineWidget {
    /// Inner area available to the cards
    pub fn inner(area: Rect) -> Rect {
        Block::default().borders(Borders::ALL).inner(area)
    }

    pub fn render(frame: &mut Frame, area: Rect, app: &App, now: Instant) {
        let theme = &app.theme;
        let block = Block::default()
            .title(format!(" {} ", app.config.ui.title))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.accent))
            .style(Style::default().bg(theme.bg0));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let height = inner.height as usize;
        let first_row = app.first_visible_row();

        // Which card line lands on each viewport row, after the reveal rise
        let styles: Vec<RevealStyle> = (0..app.layout.len())
            .map(|entry| app.sync.entry_style(entry, now))
            .collect();
        let mut rows: Vec<Option<(usize, u16)>> = vec![None; height];
        for (entry, style) in styles.iter().enumerate() {
            let Some(card) = app.layout.card(entry) else {
                continue;
            };
            if style.opacity <= 0.0 {
                continue;
            }
            let shift = style.rise.round() as i32;
            for line in 0..card.height() {
                let row = card.top as i32 + line as i32 + shift - first_row;
                if (0..height as i32).contains(&row) {
                    rows[row as usize] = Some((entry, line));
                }
            }
        }

        let current = app.current_event();
        let marker_row = app.pad_top() as usize;
        let content_height = app.layout.content_height() as i32;

        let lines: Vec<Line> = rows
            .iter()
            .enumerate()
            .map(|(row, slot)| {
                let marker = if row == marker_row {
                    Span::styled("▶", Style::default().fg(theme.orange))
                } else {
                    Span::raw(" ")
                };

                let placed = slot.and_then(|(entry, line)| {
                    app.layout.card(entry).map(|card| (entry, card, line))
                });
                match placed {
                    Some((entry, card, line)) => Self::card_line(
                        app,
                        card,
                        line,
                        styles[entry],
                        current == Some(entry),
                        marker,
                    ),
                    None => {
                        let content_row = first_row + row as i32;
                        let rule = if (0..content_height).contains(&content_row) {
                            "│"
                        } else {
                            " "
                        };
                        Line::from(vec![
                            marker,
                            Span::styled(rule, Style::default().fg(theme.grey0)),
                        ])
                    }
                }
            })
            .collect();

        let paragraph = Paragraph::new(lines).style(Style::default().bg(theme.bg0));
        frame.render_widget(paragraph, inner);
    }

    fn card_line<'a>(
        app: &'a App,
        card: &'a CardLayout,
        line: u16,
        style: RevealStyle,
        is_current: bool,
        marker: Span<'a>,
    ) -> Line<'a> {
        let theme = &app.theme;
        let text = card.line(line).unwrap_or("");

        let (rule, text_style) = if line == 0 {
            let color = if is_current { theme.yellow } else { theme.aqua };
            (
                "●─ ",
                Style::default()
                    .fg(theme.fade(color, style.opacity))
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            let color = if is_current { theme.fg1 } else { theme.grey1 };
            ("│  ", Style::default().fg(theme.fade(color, style.opacity)))
        };

        let rule_color = if is_current && line == 0 {
            theme.yellow
        } else {
            theme.grey0
        };

        let mut line = Line::from(vec![
            marker,
            Span::styled(rule, Style::default().fg(theme.fade(rule_color, style.opacity))),
            Span::styled(text, text_style),
        ]);
        if is_current {
            line = line.style(Style::default().bg(theme.selection));
        }
        line
    }
}

use image::{DynamicImage, GenericImageView};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::App;
use crate::photo_cache::PhotoEntry;
use crate::theme::Theme;

pub struct HeadshotWidget;

impl HeadshotWidget {
    pub fn render(frame: &mut Frame, area: Rect, app: &App) {
        let theme = &app.theme;
        let block = Block::default()
            .title(" Headshot ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.grey0))
            .style(Style::default().bg(theme.bg0));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(3)])
            .split(inner);

        let selection = app.selection_rx.borrow().clone();
        match selection.photo.as_ref().and_then(|id| app.photos.get(id)) {
            _ if selection.is_none() => {
                Self::render_message(frame, chunks[0], "No image available", theme, false);
            }
            Some(PhotoEntry::Ready(image)) => Self::render_halfblocks(frame, chunks[0], image),
            Some(PhotoEntry::Failed(error)) => {
                tracing::trace!("Headshot unavailable: {}", error);
                Self::render_message(frame, chunks[0], "Image not found", theme, false);
            }
            Some(PhotoEntry::Loading) | None => {
                Self::render_message(frame, chunks[0], "Loading image...", theme, true);
            }
        }

        Self::render_caption(frame, chunks[1], app, selection.index);
    }

    /// Current event and photo position under the image
    fn render_caption(frame: &mut Frame, area: Rect, app: &App, index: Option<usize>) {
        let theme = &app.theme;
        let mut lines = Vec::with_capacity(3);

        if let Some(event) = app.current_event().and_then(|i| app.events().get(i)) {
            lines.push(Line::from(Span::styled(
                event.year.to_string(),
                Style::default()
                    .fg(theme.yellow)
                    .add_modifier(Modifier::BOLD),
            )));
            lines.push(Line::from(Span::styled(
                event.description.as_str(),
                Style::default().fg(theme.fg0),
            )));
        }

        let total = app.sync.catalog().len();
        if let Some(index) = index {
            lines.push(Line::from(Span::styled(
                format!("Photo {}/{}", index + 1, total),
                Style::default().fg(theme.grey1),
            )));
        }

        let paragraph = Paragraph::new(lines)
            .style(Style::default().bg(theme.bg0))
            .alignment(Alignment::Center);
        frame.render_widget(paragraph, area);
    }

    /// Centered one-line message
    fn render_message(frame: &mut Frame, area: Rect, message: &str, theme: &Theme, busy: bool) {
        let style = if busy {
            Style::default()
                .fg(theme.yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
                .fg(theme.grey1)
                .add_modifier(Modifier::ITALIC)
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(message, style)))
            .style(Style::default().bg(theme.bg0))
            .alignment(Alignment::Center);

        // Center vertically
        let centered_area = Rect {
            x: area.x,
            y: area.y + area.height / 2,
            width: area.width,
            height: area.height.min(1),
        };
        frame.render_widget(paragraph, centered_area);
    }

    /// Render image using halfblock characters, two pixels per cell
    fn render_halfblocks(frame: &mut Frame, area: Rect, img: &DynamicImage) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let target_width = area.width as u32;
        let target_height = (area.height as u32) * 2;

        // Aspect-ratio preserving dimensions
        let (img_width, img_height) = img.dimensions();
        if img_width == 0 || img_height == 0 {
            return;
        }
        let scale_w = target_width as f32 / img_width as f32;
        let scale_h = target_height as f32 / img_height as f32;
        let scale = scale_w.min(scale_h);

        let new_width = ((img_width as f32 * scale) as u32).clamp(1, target_width);
        let new_height = ((img_height as f32 * scale) as u32).clamp(1, target_height);

        let resized = img.resize_exact(
            new_width,
            new_height,
            image::imageops::FilterType::Triangle,
        );
        let rgba = resized.to_rgba8();

        let x_offset = target_width.saturating_sub(new_width) / 2;
        let rows = new_height.div_ceil(2);
        let y_offset = (area.height as u32).saturating_sub(rows) / 2;

        let lines: Vec<Line> = (0..rows)
            .map(|row| {
                let y = row * 2;
                let mut spans: Vec<Span> = Vec::with_capacity(new_width as usize + 1);
                if x_offset > 0 {
                    spans.push(Span::raw(" ".repeat(x_offset as usize)));
                }

                for x in 0..new_width {
                    let top = rgba.get_pixel(x, y);
                    let bottom = if y + 1 < new_height {
                        rgba.get_pixel(x, y + 1)
                    } else {
                        top
                    };
                    spans.push(Span::styled(
                        "▀",
                        Style::default()
                            .fg(Color::Rgb(top[0], top[1], top[2]))
                            .bg(Color::Rgb(bottom[0], bottom[1], bottom[2])),
                    ));
                }
                Line::from(spans)
            })
            .collect();

        let image_area = Rect {
            x: area.x,
            y: area.y + y_offset as u16,
            width: area.width,
            height: (rows as u16).min(area.height),
        };
        frame.render_widget(Paragraph::new(lines), image_area);
    }
}

//! Row layout of the timeline cards
//!
//! Each event becomes a card: one year row, the wrapped description and a
//! blank spacer row. Rows are counted from the top of the timeline region.

use agescroll_core::TimelineEvent;
use unicode_width::UnicodeWidthChar;

/// Columns taken by the rule and indent left of the card text
pub const CARD_INDENT: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct CardLayout {
    /// First row of the card within the region
    pub top: u16,
    pub year: String,
    pub description: Vec<String>,
}

impl CardLayout {
    /// Rows taken including the trailing spacer
    pub fn height(&self) -> u16 {
        self.description.len() as u16 + 2
    }

    /// Text of the card row at `line` (0 = year row); the spacer is empty
    pub fn line(&self, line: u16) -> Option<&str> {
        match line {
            0 => Some(&self.year),
            n => self.description.get(n as usize - 1).map(String::as_str),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TimelineLayout {
    cards: Vec<CardLayout>,
    width: u16,
    content_height: u16,
}

impl TimelineLayout {
    /// Lay out `events` for a region `width` columns wide
    pub fn new(events: &[TimelineEvent], width: u16) -> Self {
        let text_width = width.saturating_sub(CARD_INDENT).max(1) as usize;
        let mut top: u16 = 0;
        let cards = events
            .iter()
            .map(|event| {
                let card = CardLayout {
                    top,
                    year: event.year.to_string(),
                    description: wrap(&event.description, text_width),
                };
                top = top.saturating_add(card.height());
                card
            })
            .collect();

        Self {
            cards,
            width,
            content_height: top,
        }
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Total rows of all cards
    pub fn content_height(&self) -> u16 {
        self.content_height
    }

    pub fn card(&self, entry: usize) -> Option<&CardLayout> {
        self.cards.get(entry)
    }

    /// Card covering `row`; rows past the end map to the last card
    pub fn entry_at(&self, row: u16) -> Option<usize> {
        if self.cards.is_empty() {
            return None;
        }
        let index = self.cards.partition_point(|card| card.top <= row);
        Some(index.saturating_sub(1))
    }

    /// Cards with at least one row inside `[first_row, first_row + rows)`
    ///
    /// `first_row` may be negative when padding above the region is on screen.
    pub fn visible_entries(&self, first_row: i32, rows: u16) -> Vec<usize> {
        let last_row = first_row + rows as i32;
        self.cards
            .iter()
            .enumerate()
            .filter(|(_, card)| {
                let top = card.top as i32;
                let bottom = top + card.height() as i32;
                top < last_row && bottom > first_row
            })
            .map(|(i, _)| i)
            .collect()
    }
}

/// Greedy word wrap by display width; overlong words are split
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    let mut line_width = 0;

    for word in text.split_whitespace() {
        let word_width: usize = word.chars().filter_map(|c| c.width()).sum();

        if line_width > 0 && line_width + 1 + word_width <= width {
            line.push(' ');
            line.push_str(word);
            line_width += 1 + word_width;
            continue;
        }

        if line_width > 0 {
            lines.push(std::mem::take(&mut line));
            line_width = 0;
        }

        if word_width <= width {
            line.push_str(word);
            line_width = word_width;
            continue;
        }

        for c in word.chars() {
            let w = c.width().unwrap_or(0);
            if line_width + w > width && line_width > 0 {
                lines.push(std::mem::take(&mut line));
                line_width = 0;
            }
            line.push(c);
            line_width += w;
        }
    }

    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

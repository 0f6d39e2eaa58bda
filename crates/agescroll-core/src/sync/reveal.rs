//! One-shot entrance animation for timeline entries

use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use super::easing::EasingType;
use super::timing::{lerp, progress_at};
use crate::config::RevealConfig;

/// Visual state of an entry at a point in time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RevealStyle {
    /// 0.0 = invisible, 1.0 = fully shown
    pub opacity: f64,
    /// Rows the entry is still displaced downward
    pub rise: f64,
}

impl RevealStyle {
    pub const VISIBLE: RevealStyle = RevealStyle {
        opacity: 1.0,
        rise: 0.0,
    };

    pub fn is_visible(&self) -> bool {
        self.opacity >= 1.0 && self.rise <= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryState {
    /// Animation starts at the given instant (may be in the future when staggered)
    Animating { start: Instant },
    Revealed,
}

/// Tracks which timeline entries have been revealed and animates the first showing
///
/// Entries are identified by their index in the static timeline. Each entry
/// animates once; seeing it again never restarts the animation.
#[derive(Debug, Clone)]
pub struct TimelineRevealController {
    stagger: Duration,
    duration: Duration,
    offset_rows: f64,
    easing: EasingType,
    entries: HashMap<usize, EntryState>,
}

impl TimelineRevealController {
    pub fn new(config: &RevealConfig) -> Self {
        Self {
            stagger: Duration::from_millis(config.stagger_ms),
            duration: Duration::from_millis(config.duration_ms),
            offset_rows: config.offset_rows as f64,
            easing: config.easing,
            entries: HashMap::new(),
        }
    }

    /// Create a controller that treats `revealed` entries as already shown
    pub fn with_revealed(config: &RevealConfig, revealed: HashSet<usize>) -> Self {
        let mut controller = Self::new(config);
        controller.entries = revealed
            .into_iter()
            .map(|entry| (entry, EntryState::Revealed))
            .collect();
        controller
    }

    /// Start the reveal of one entry at `now`
    ///
    /// Returns false if the entry was already triggered.
    pub fn trigger(&mut self, entry: usize, now: Instant) -> bool {
        self.schedule(entry, now)
    }

    fn schedule(&mut self, entry: usize, start: Instant) -> bool {
        if self.entries.contains_key(&entry) {
            return false;
        }
        self.entries.insert(entry, EntryState::Animating { start });
        true
    }

    /// Reveal entries that became visible, staggered in entry order
    ///
    /// Returns the number of animations started.
    pub fn observe<I>(&mut self, visible: I, now: Instant) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        let mut fresh: Vec<usize> = visible
            .into_iter()
            .filter(|entry| !self.entries.contains_key(entry))
            .collect();
        fresh.sort_unstable();
        fresh.dedup();

        let mut delay = Duration::ZERO;
        for &entry in &fresh {
            self.schedule(entry, now + delay);
            delay += self.stagger;
        }

        if !fresh.is_empty() {
            tracing::trace!(entries = ?fresh, "Revealing timeline entries");
        }
        fresh.len()
    }

    /// Style of an entry at `now`; untriggered entries are hidden
    pub fn style(&self, entry: usize, now: Instant) -> RevealStyle {
        match self.entries.get(&entry) {
            None => RevealStyle {
                opacity: 0.0,
                rise: self.offset_rows,
            },
            Some(EntryState::Revealed) => RevealStyle::VISIBLE,
            Some(EntryState::Animating { start }) => {
                let eased = self.easing.apply(progress_at(*start, now, self.duration));
                RevealStyle {
                    opacity: eased,
                    rise: lerp(self.offset_rows, 0.0, eased),
                }
            }
        }
    }

    pub fn is_triggered(&self, entry: usize) -> bool {
        self.entries.contains_key(&entry)
    }

    /// Whether any reveal is still running (or waiting on its stagger) at `now`
    pub fn is_animating(&self, now: Instant) -> bool {
        self.entries.values().any(|state| match state {
            EntryState::Animating { start } => now < *start + self.duration,
            EntryState::Revealed => false,
        })
    }

    /// Mark finished animations as revealed
    pub fn tick(&mut self, now: Instant) {
        let duration = self.duration;
        for state in self.entries.values_mut() {
            if let EntryState::Animating { start } = *state {
                if now >= start + duration {
                    *state = EntryState::Revealed;
                }
            }
        }
    }

    /// Stop all animations, snapping them to the revealed state
    ///
    /// Returns every entry seen so far so a replacement controller can skip them.
    pub fn cancel(&mut self) -> HashSet<usize> {
        self.entries.drain().map(|(entry, _)| entry).collect()
    }
}

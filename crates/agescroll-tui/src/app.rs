use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use agescroll_core::media::{CatalogRefresh, RefreshReason};
use agescroll_core::sync::RegionGeometry;
use agescroll_core::{AppConfig, PhotoId, Selection, SyncController, TimelineEvent};
use chrono::{DateTime, Local};
use tokio::sync::watch;

use crate::input::Action;
use crate::layout::TimelineLayout;
use crate::photo_cache::PhotoCache;
use crate::scroll::ScrollAnimator;
use crate::theme::Theme;

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Help overlay
    Help,
}

/// Side effect requested by an action, carried out by the run loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    RefreshCatalog,
}

/// Application state
pub struct App {
    /// Application configuration
    pub config: Arc<AppConfig>,
    pub theme: Theme,
    /// Scroll-to-photo synchronization
    pub sync: SyncController,
    /// Receives every change of the selected photo
    pub selection_rx: watch::Receiver<Selection>,
    /// Timeline scroll offset
    pub scroll: ScrollAnimator,
    pub layout: TimelineLayout,
    pub photos: PhotoCache,
    /// Rows of the timeline viewport
    pub viewport_height: u16,
    /// Current application mode
    pub mode: Mode,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Status message
    pub status_message: Option<String>,
    /// Pending key for multi-key sequences (e.g., 'gg')
    pub pending_key: Option<char>,
    /// A catalog refresh has been requested and not yet applied
    pub refreshing: bool,
    /// Time of the last successful catalog refresh
    pub last_refresh: Option<DateTime<Local>>,
    /// Files to upload once the current refresh has been applied
    pub pending_upload: Vec<PathBuf>,
}

impl App {
    pub fn new(config: Arc<AppConfig>) -> Self {
        let sync = SyncController::from_config(&config);
        let selection_rx = sync.subscribe();
        let mut app = Self {
            theme: Theme::by_name(&config.ui.theme),
            scroll: ScrollAnimator::new(config.scroll.clone()),
            layout: TimelineLayout::default(),
            photos: PhotoCache::new(),
            viewport_height: 0,
            mode: Mode::Normal,
            should_quit: false,
            status_message: None,
            pending_key: None,
            refreshing: false,
            last_refresh: None,
            pending_upload: Vec::new(),
            sync,
            selection_rx,
            config,
        };
        app.mount_timeline();
        app
    }

    pub fn events(&self) -> &[TimelineEvent] {
        &self.config.timeline.events
    }

    /// The timeline is on screen; the subscription attaches once photos are known
    fn mount_timeline(&mut self) {
        if let Err(e) = self.sync.mount_region() {
            tracing::debug!("Timeline mounted before photos: {}", e);
        }
    }

    /// Resize the timeline viewport, re-wrapping cards when the width changes
    pub fn set_viewport(&mut self, width: u16, height: u16) {
        if self.layout.width() != width || self.layout.len() != self.events().len() {
            self.layout = TimelineLayout::new(&self.config.timeline.events, width);
        }
        self.viewport_height = height;
    }

    /// Padding rows above the first card so the reference line can reach it
    pub fn pad_top(&self) -> u16 {
        (self.sync.reference() * self.viewport_height as f64).round() as u16
    }

    /// Padding below the last card; together with `pad_top` one viewport
    pub fn pad_bottom(&self) -> u16 {
        self.viewport_height.saturating_sub(self.pad_top())
    }

    /// Largest scroll offset; padding makes it equal the content height
    pub fn max_scroll(&self) -> u16 {
        self.layout.content_height()
    }

    /// Region start in progress terms: exactly where the reference line sits at offset 0
    ///
    /// Not rounded like `pad_top`, so the line meets the region end at `max_scroll`.
    pub fn region_top(&self) -> f64 {
        self.sync.reference() * self.viewport_height as f64
    }

    pub fn geometry(&self) -> RegionGeometry {
        RegionGeometry::new(
            self.scroll.current_scroll() as f64,
            self.viewport_height as f64,
            self.region_top(),
            self.layout.content_height() as f64,
        )
    }

    /// Region row shown at the top of the viewport (negative inside the top padding)
    pub fn first_visible_row(&self) -> i32 {
        self.scroll.current_scroll() as i32 - self.pad_top() as i32
    }

    /// Advance animations and feed the new position to the sync controller
    pub fn update_frame(&mut self, now: Instant) {
        let max_scroll = self.max_scroll();
        self.scroll.update_at(now, max_scroll);
        self.sync.observe(&self.geometry());

        let visible = self
            .layout
            .visible_entries(self.first_visible_row(), self.viewport_height);
        self.sync.observe_entries(visible, now);

        if !self.scroll.needs_update() {
            self.sync.settle();
        }
    }

    /// Whether the next frame should come at animation speed
    pub fn is_animating(&self, now: Instant) -> bool {
        self.scroll.needs_update() || self.sync.is_revealing(now)
    }

    /// Index of the event under the reference line
    pub fn current_event(&self) -> Option<usize> {
        self.layout.entry_at(self.scroll.current_scroll())
    }

    /// Photo whose selection changed and still needs loading
    pub fn photo_to_load(&mut self) -> Option<PhotoId> {
        if !self.selection_rx.has_changed().unwrap_or(false) {
            return None;
        }
        let photo = self.selection_rx.borrow_and_update().photo.clone()?;
        self.photos.start_loading(&photo).then_some(photo)
    }

    /// Files ready to upload, once no other refresh is in flight
    ///
    /// The upload re-lists the catalog when it finishes, so the live timeline
    /// is rebuilt against the new photos.
    pub fn take_upload(&mut self) -> Option<Vec<PathBuf>> {
        if self.refreshing || self.pending_upload.is_empty() {
            return None;
        }
        let files = std::mem::take(&mut self.pending_upload);
        self.refreshing = true;
        self.set_status(format!("Uploading {} photo(s)...", files.len()));
        Some(files)
    }

    /// Scroll so the photo pinned on the current event is selected
    pub fn jump_to_pinned(&mut self) {
        let Some(event) = self.current_event().and_then(|i| self.events().get(i)) else {
            return;
        };
        let year = event.year;
        let Some(photo) = event.photo.clone() else {
            self.set_status(format!("No photo pinned to {}", year));
            return;
        };
        let Some(progress) = self.sync.progress_for_photo(&photo) else {
            self.set_status(format!("Pinned photo {} is not in the store", photo));
            return;
        };

        let target = self
            .geometry()
            .offset_for(progress, self.sync.reference())
            .round()
            .max(0.0) as u16;
        let max_scroll = self.max_scroll();
        self.scroll.scroll_to(target, max_scroll);
    }

    /// Apply an input action
    pub fn apply(&mut self, action: Action) -> Effect {
        if action != Action::PendingG {
            self.pending_key = None;
        }

        let max_scroll = self.max_scroll();
        let viewport = self.viewport_height;
        match action {
            Action::Quit => self.should_quit = true,
            Action::ScrollDown => self.scroll.scroll_down(max_scroll),
            Action::ScrollUp => self.scroll.scroll_up(max_scroll),
            Action::HalfPageDown => self.scroll.scroll_half_page_down(viewport, max_scroll),
            Action::HalfPageUp => self.scroll.scroll_half_page_up(viewport, max_scroll),
            Action::PageDown => self.scroll.scroll_full_page_down(viewport, max_scroll),
            Action::PageUp => self.scroll.scroll_full_page_up(viewport, max_scroll),
            Action::JumpToTop => self.scroll.scroll_to(0, max_scroll),
            Action::JumpToBottom => self.scroll.scroll_to(max_scroll, max_scroll),
            Action::PendingG => self.pending_key = Some('g'),
            Action::JumpToPinned => self.jump_to_pinned(),
            Action::Refresh => {
                if self.refreshing {
                    return Effect::None;
                }
                self.refreshing = true;
                self.set_status("Refreshing photos...");
                return Effect::RefreshCatalog;
            }
            Action::ToggleHelp => {
                self.mode = match self.mode {
                    Mode::Help => Mode::Normal,
                    Mode::Normal => Mode::Help,
                };
            }
            Action::ExitMode => {
                self.mode = Mode::Normal;
                self.status_message = None;
            }
            Action::None => {}
        }
        Effect::None
    }

    /// Apply a finished catalog refresh
    pub fn apply_catalog_refresh(&mut self, refresh: CatalogRefresh) {
        self.refreshing = false;
        let CatalogRefresh { reason, outcome, .. } = refresh;

        match self.sync.apply_refresh(outcome) {
            Ok(()) => {
                self.last_refresh = Some(Local::now());
                self.photos.retain(self.sync.catalog());
                tracing::debug!(cached = self.photos.len(), "Photo cache pruned to catalog");
                for photo in self.config.pinned_photos() {
                    if self.sync.catalog().position(photo).is_none() {
                        tracing::warn!(photo = %photo, "Pinned photo missing from the store");
                    }
                }

                let count = self.sync.catalog().len();
                let message = if count == 0 {
                    "No images available".to_string()
                } else {
                    match reason {
                        RefreshReason::Initial => format!("Loaded {} photos", count),
                        RefreshReason::Manual => format!("Refreshed: {} photos", count),
                        RefreshReason::AfterUpload { uploaded } => {
                            format!("Uploaded {}, {} photos in store", uploaded, count)
                        }
                    }
                };
                self.set_status(message);
            }
            Err(e) => {
                if !e.is_soft() {
                    tracing::error!("Catalog refresh failed: {}", e);
                }
                let message = if self.sync.catalog().is_empty() {
                    format!("Image store unavailable: {}", e)
                } else {
                    format!("Refresh failed, showing last known photos: {}", e)
                };
                self.set_status(message);
            }
        }
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agescroll_core::{Error, MediaCatalog, SyncState};

    fn config(pinned: Option<&str>) -> AppConfig {
        let mut config = AppConfig::default();
        config.scroll.smooth_enabled = false;
        if let Some(photo) = pinned {
            config.timeline.events[0] = TimelineEvent::new(1990, "Born").with_photo(photo);
        }
        config
    }

    fn catalog(ids: &[&str]) -> MediaCatalog {
        ids.iter().map(|id| PhotoId::from(*id)).collect()
    }

    fn refresh(outcome: agescroll_core::Result<MediaCatalog>) -> CatalogRefresh {
        CatalogRefresh {
            generation: 1,
            reason: RefreshReason::Initial,
            outcome,
        }
    }

    /// Seven default events in 3-row cards: 21 content rows, 10-row viewport
    fn loaded(pinned: Option<&str>) -> App {
        let mut app = App::new(Arc::new(config(pinned)));
        app.set_viewport(40, 10);
        app.apply_catalog_refresh(refresh(Ok(catalog(&["a.jpg", "b.jpg", "c.jpg"]))));
        app.update_frame(Instant::now());
        app
    }

    #[test]
    fn test_padding_and_max_scroll() {
        let app = loaded(None);
        assert_eq!(app.layout.content_height(), 21);
        assert_eq!(app.pad_top(), 5);
        assert_eq!(app.pad_bottom(), 5);
        assert_eq!(app.max_scroll(), 21);
        assert_eq!(app.first_visible_row(), -5);
    }

    #[test]
    fn test_scrolling_selects_photos() {
        let mut app = loaded(None);
        assert_eq!(app.sync.state(), SyncState::Subscribed);
        assert_eq!(app.sync.selection(), Some(0));

        app.apply(Action::JumpToBottom);
        app.update_frame(Instant::now());
        assert_eq!(app.sync.selection(), Some(2));
        assert_eq!(app.current_event(), Some(6));

        app.scroll.set_scroll(10);
        app.update_frame(Instant::now());
        assert_eq!(app.sync.selection(), Some(1));
    }

    #[test]
    fn test_bottom_selects_last_photo_with_odd_viewport() {
        let mut app = App::new(Arc::new(config(None)));
        app.set_viewport(40, 11);
        let photos: MediaCatalog = (0..50)
            .map(|i| PhotoId::from(format!("{:02}.jpg", i)))
            .collect();
        app.apply_catalog_refresh(refresh(Ok(photos)));
        app.update_frame(Instant::now());
        assert_eq!(app.pad_top(), 6);
        assert_eq!(app.region_top(), 5.5);

        app.apply(Action::JumpToBottom);
        app.update_frame(Instant::now());
        assert_eq!(app.scroll.current_scroll(), app.max_scroll());
        assert_eq!(app.sync.selection(), Some(49));

        app.apply(Action::JumpToTop);
        app.update_frame(Instant::now());
        assert_eq!(app.sync.selection(), Some(0));
    }

    #[test]
    fn test_selection_change_requests_load_once() {
        let mut app = loaded(None);
        assert_eq!(app.photo_to_load(), Some(PhotoId::from("a.jpg")));
        assert_eq!(app.photo_to_load(), None);

        app.apply(Action::JumpToBottom);
        app.update_frame(Instant::now());
        assert_eq!(app.photo_to_load(), Some(PhotoId::from("c.jpg")));
    }

    #[test]
    fn test_jump_to_pinned_photo() {
        let mut app = loaded(Some("b.jpg"));
        app.apply(Action::JumpToPinned);
        app.update_frame(Instant::now());
        assert_eq!(app.scroll.current_scroll(), 11);
        assert_eq!(app.sync.selected_photo(), Some(&PhotoId::from("b.jpg")));
    }

    #[test]
    fn test_jump_without_pin_sets_status() {
        let mut app = loaded(None);
        app.apply(Action::JumpToPinned);
        assert_eq!(app.status_message.as_deref(), Some("No photo pinned to 1990"));
        assert_eq!(app.scroll.current_scroll(), 0);
    }

    #[test]
    fn test_failed_refresh_keeps_photos() {
        let mut app = loaded(None);
        app.apply_catalog_refresh(refresh(Err(Error::StoreUnavailable("down".into()))));
        assert_eq!(app.sync.catalog().len(), 3);
        assert_eq!(app.sync.state(), SyncState::Subscribed);
        assert!(app
            .status_message
            .as_deref()
            .is_some_and(|m| m.starts_with("Refresh failed")));
    }

    #[test]
    fn test_empty_store_message() {
        let mut app = App::new(Arc::new(config(None)));
        app.set_viewport(40, 10);
        app.apply_catalog_refresh(refresh(Ok(MediaCatalog::empty())));
        assert_eq!(app.sync.state(), SyncState::Idle);
        assert_eq!(app.status_message.as_deref(), Some("No images available"));
    }

    #[test]
    fn test_refresh_requested_once() {
        let mut app = loaded(None);
        assert_eq!(app.apply(Action::Refresh), Effect::RefreshCatalog);
        assert_eq!(app.apply(Action::Refresh), Effect::None);
    }

    #[test]
    fn test_upload_waits_for_refresh_then_relists() {
        let mut app = App::new(Arc::new(config(None)));
        app.set_viewport(40, 10);
        app.pending_upload = vec![PathBuf::from("d.jpg"), PathBuf::from("e.jpg")];
        app.refreshing = true;
        assert_eq!(app.take_upload(), None);

        app.apply_catalog_refresh(refresh(Ok(catalog(&["a.jpg", "b.jpg", "c.jpg"]))));
        app.update_frame(Instant::now());
        assert_eq!(app.sync.state(), SyncState::Subscribed);

        let files = app.take_upload().unwrap();
        assert_eq!(files.len(), 2);
        assert!(app.refreshing);
        assert_eq!(app.status_message.as_deref(), Some("Uploading 2 photo(s)..."));
        assert_eq!(app.take_upload(), None);
        assert_eq!(app.apply(Action::Refresh), Effect::None);

        app.apply_catalog_refresh(CatalogRefresh {
            generation: 2,
            reason: RefreshReason::AfterUpload { uploaded: 2 },
            outcome: Ok(catalog(&["a.jpg", "b.jpg", "c.jpg", "d.jpg", "e.jpg"])),
        });
        assert_eq!(
            app.status_message.as_deref(),
            Some("Uploaded 2, 5 photos in store")
        );
        assert_eq!(app.sync.state(), SyncState::Subscribed);
        assert_eq!(app.sync.selection(), None);

        app.apply(Action::JumpToBottom);
        app.update_frame(Instant::now());
        assert_eq!(app.sync.selected_photo(), Some(&PhotoId::from("e.jpg")));
    }

    #[test]
    fn test_pending_g_cleared_by_other_keys() {
        let mut app = loaded(None);
        app.apply(Action::PendingG);
        assert_eq!(app.pending_key, Some('g'));
        app.apply(Action::ScrollDown);
        assert_eq!(app.pending_key, None);
    }
}

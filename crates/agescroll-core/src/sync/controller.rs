//! Scroll-to-photo synchronization state machine
//!
//! ```text
//!   Idle ──catalog non-empty──▶ Ready ──region mounted──▶ Subscribed ─┐
//!                                 ▲                           │   ▲    │ catalog refresh
//!                                 └──────catalog empty────────┘   └────┘
//!   any ──dispose──▶ Disposed (terminal)
//! ```

use std::collections::HashSet;
use std::fmt;
use std::time::Instant;

use tokio::sync::watch;
use tracing::{debug, trace, warn};

use super::progress::{ProgressEvent, RegionGeometry, ScrollProgressSource};
use super::reveal::{RevealStyle, TimelineRevealController};
use super::selector::select_frame;
use crate::config::{AppConfig, RevealConfig, ScrollConfig};
use crate::media::{MediaCatalog, PhotoId};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// No catalog yet
    Idle,
    /// Catalog known, no progress subscription attached
    Ready,
    /// Progress source and reveal controller attached to the region
    Subscribed,
    /// Torn down; every further input is ignored
    Disposed,
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncState::Idle => "idle",
            SyncState::Ready => "ready",
            SyncState::Subscribed => "subscribed",
            SyncState::Disposed => "disposed",
        };
        f.write_str(name)
    }
}

/// Identity of one attached progress subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

/// Currently selected photo, as published to consumers
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub index: Option<usize>,
    pub photo: Option<PhotoId>,
}

impl Selection {
    pub fn is_none(&self) -> bool {
        self.index.is_none()
    }
}

struct Subscription {
    id: SubscriptionId,
    progress: ScrollProgressSource,
    reveal: TimelineRevealController,
}

/// Owns the progress subscription for the timeline region and publishes the selected photo
///
/// All methods are synchronous and O(1) on the scroll path. Input arriving
/// after `dispose()`, or tagged with a subscription that has since been torn
/// down, is dropped without error.
pub struct SyncController {
    state: SyncState,
    catalog: MediaCatalog,
    subscription: Option<Subscription>,
    region_mounted: bool,
    selection: Option<usize>,
    publisher: watch::Sender<Selection>,
    next_subscription: u64,
    reference: f64,
    reveal_config: RevealConfig,
    /// Entries revealed under earlier subscriptions
    revealed: HashSet<usize>,
    pending: Vec<ProgressEvent>,
}

impl SyncController {
    pub fn new(scroll: &ScrollConfig, reveal: &RevealConfig) -> Self {
        let (publisher, _) = watch::channel(Selection::default());
        Self {
            state: SyncState::Idle,
            catalog: MediaCatalog::empty(),
            subscription: None,
            region_mounted: false,
            selection: None,
            publisher,
            next_subscription: 0,
            reference: scroll.reference,
            reveal_config: reveal.clone(),
            revealed: HashSet::new(),
            pending: Vec::with_capacity(4),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(&config.scroll, &config.reveal)
    }

    #[inline]
    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn catalog(&self) -> &MediaCatalog {
        &self.catalog
    }

    /// Selected catalog index, `None` until progress is observed or when the catalog is empty
    #[inline]
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn selected_photo(&self) -> Option<&PhotoId> {
        self.selection.and_then(|i| self.catalog.get(i))
    }

    /// Receive every change of the selected photo
    pub fn subscribe(&self) -> watch::Receiver<Selection> {
        self.publisher.subscribe()
    }

    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        self.subscription.as_ref().map(|s| s.id)
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.state == SyncState::Disposed
    }

    /// Whether a scroll gesture is in progress on the attached source
    pub fn is_scrolling(&self) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.progress.is_scrolling())
    }

    /// Replace the catalog with a new snapshot
    pub fn set_catalog(&mut self, catalog: MediaCatalog) {
        match self.state {
            SyncState::Disposed => {
                trace!("Catalog update after dispose dropped");
            }
            SyncState::Idle if catalog.is_empty() => {
                debug!("Catalog still empty, staying idle");
            }
            SyncState::Idle | SyncState::Ready => {
                self.catalog = catalog;
                self.transition(SyncState::Ready);
                if self.region_mounted && !self.catalog.is_empty() {
                    self.attach();
                }
            }
            SyncState::Subscribed => {
                // Old indices may point at removed photos
                self.reset_selection();
                self.detach();
                self.catalog = catalog;
                if self.catalog.is_empty() {
                    self.transition(SyncState::Ready);
                } else {
                    self.attach();
                }
            }
        }
    }

    /// Apply the outcome of a catalog fetch
    ///
    /// On failure the last known catalog is kept and the error is returned
    /// for the caller to surface. After disposal the outcome is ignored.
    pub fn apply_refresh(&mut self, outcome: Result<MediaCatalog>) -> Result<()> {
        if self.is_disposed() {
            trace!("Catalog refresh after dispose dropped");
            return Ok(());
        }
        match outcome {
            Ok(catalog) => {
                self.set_catalog(catalog);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, photos = self.catalog.len(), "Keeping last known catalog");
                Err(e)
            }
        }
    }

    /// The timeline region is on screen
    ///
    /// Returns `Error::NoMediaAvailable` when there is nothing to show yet;
    /// the subscription attaches as soon as a non-empty catalog arrives.
    pub fn mount_region(&mut self) -> Result<()> {
        if self.is_disposed() {
            return Ok(());
        }
        self.region_mounted = true;
        match self.state {
            SyncState::Ready if !self.catalog.is_empty() => {
                self.attach();
                Ok(())
            }
            SyncState::Subscribed => Ok(()),
            _ => Err(Error::NoMediaAvailable),
        }
    }

    /// Sample the region geometry and dispatch resulting progress events
    pub fn observe(&mut self, geometry: &RegionGeometry) {
        let Some(subscription) = self.subscription.as_mut() else {
            return;
        };
        let id = subscription.id;
        let mut events = std::mem::take(&mut self.pending);
        subscription.progress.observe(geometry, &mut events);
        for event in events.drain(..) {
            self.handle_progress(id, event);
        }
        self.pending = events;
    }

    /// Reveal timeline entries that are now visible
    pub fn observe_entries<I>(&mut self, visible: I, now: Instant) -> usize
    where
        I: IntoIterator<Item = usize>,
    {
        match self.subscription.as_mut() {
            Some(subscription) => {
                subscription.reveal.tick(now);
                subscription.reveal.observe(visible, now)
            }
            None => 0,
        }
    }

    /// Style of a timeline entry; entries render fully when nothing is attached
    pub fn entry_style(&self, entry: usize, now: Instant) -> RevealStyle {
        self.subscription
            .as_ref()
            .map(|s| s.reveal.style(entry, now))
            .unwrap_or(RevealStyle::VISIBLE)
    }

    pub fn is_revealing(&self, now: Instant) -> bool {
        self.subscription
            .as_ref()
            .is_some_and(|s| s.reveal.is_animating(now))
    }

    /// End the current scroll gesture
    pub fn settle(&mut self) {
        let settled = self
            .subscription
            .as_mut()
            .and_then(|s| s.progress.settle().map(|event| (s.id, event)));
        if let Some((id, event)) = settled {
            self.handle_progress(id, event);
        }
    }

    /// Pause or resume progress tracking without dropping the subscription
    pub fn set_tracking(&mut self, enabled: bool) {
        let Some(subscription) = self.subscription.as_mut() else {
            return;
        };
        let id = subscription.id;
        if enabled {
            subscription.progress.enable();
        } else if let Some(event) = subscription.progress.disable() {
            self.handle_progress(id, event);
        }
    }

    /// Handle one progress event from subscription `id`
    pub fn handle_progress(&mut self, id: SubscriptionId, event: ProgressEvent) {
        if self.state != SyncState::Subscribed || self.subscription_id() != Some(id) {
            trace!(?id, ?event, state = %self.state, "Dropping stale progress event");
            return;
        }

        match event {
            ProgressEvent::Start => trace!("Scroll gesture started"),
            ProgressEvent::End => trace!("Scroll gesture ended"),
            ProgressEvent::Update(progress) => self.select(progress),
        }
    }

    /// Scroll progress at which `photo` becomes the selection (middle of its band)
    pub fn progress_for_photo(&self, photo: &PhotoId) -> Option<f64> {
        let index = self.catalog.position(photo)?;
        Some((index as f64 + 0.5) / self.catalog.len() as f64)
    }

    /// Release everything; the controller ignores all input afterwards
    pub fn dispose(&mut self) {
        if self.is_disposed() {
            return;
        }
        self.detach();
        self.reset_selection();
        self.catalog = MediaCatalog::empty();
        self.revealed.clear();
        self.region_mounted = false;
        self.transition(SyncState::Disposed);
    }

    fn select(&mut self, progress: f64) {
        let progress = if progress.is_nan() {
            0.0
        } else {
            progress.clamp(0.0, 1.0)
        };
        let Some(len) = self.catalog.non_zero_len() else {
            return;
        };

        let index = select_frame(progress, len);
        if self.selection != Some(index) {
            self.selection = Some(index);
            self.publish();
        }
    }

    fn reset_selection(&mut self) {
        if self.selection.take().is_some() {
            self.publish();
        }
    }

    fn publish(&self) {
        let selection = Selection {
            index: self.selection,
            photo: self.selected_photo().cloned(),
        };
        trace!(index = ?selection.index, "Publishing selection");
        self.publisher.send_replace(selection);
    }

    fn attach(&mut self) {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        let revealed = std::mem::take(&mut self.revealed);
        self.subscription = Some(Subscription {
            id,
            progress: ScrollProgressSource::new(self.reference),
            reveal: TimelineRevealController::with_revealed(&self.reveal_config, revealed),
        });
        debug!(?id, photos = self.catalog.len(), "Attached scroll subscription");
        self.transition(SyncState::Subscribed);
    }

    fn detach(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.progress.disable();
            self.revealed.extend(subscription.reveal.cancel());
            debug!(id = ?subscription.id, "Detached scroll subscription");
        }
    }

    fn transition(&mut self, next: SyncState) {
        if self.state != next {
            debug!(from = %self.state, to = %next, "Sync state change");
            self.state = next;
        }
    }
}

impl Drop for SyncController {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn catalog(ids: &[&str]) -> MediaCatalog {
        ids.iter().map(|id| PhotoId::from(*id)).collect()
    }

    fn controller() -> SyncController {
        SyncController::from_config(&AppConfig::default())
    }

    /// Region of 100 rows, 20-row viewport, padded so offset == progress * 100
    fn at(progress: f64) -> RegionGeometry {
        RegionGeometry::new(progress * 100.0, 20.0, 10.0, 100.0)
    }

    fn subscribed(ids: &[&str]) -> SyncController {
        let mut sync = controller();
        sync.set_catalog(catalog(ids));
        sync.mount_region().unwrap();
        assert_eq!(sync.state(), SyncState::Subscribed);
        sync
    }

    #[test]
    fn test_idle_until_catalog_arrives() {
        let mut sync = controller();
        assert_eq!(sync.state(), SyncState::Idle);

        sync.set_catalog(MediaCatalog::empty());
        assert_eq!(sync.state(), SyncState::Idle);

        assert!(matches!(sync.mount_region(), Err(Error::NoMediaAvailable)));
        assert_eq!(sync.subscription_id(), None);

        // Region already mounted, so the catalog attaches immediately
        sync.set_catalog(catalog(&["p0"]));
        assert_eq!(sync.state(), SyncState::Subscribed);
    }

    #[test]
    fn test_ready_waits_for_region() {
        let mut sync = controller();
        sync.set_catalog(catalog(&["p0", "p1"]));
        assert_eq!(sync.state(), SyncState::Ready);
        assert_eq!(sync.subscription_id(), None);

        sync.observe(&at(0.9));
        assert_eq!(sync.selection(), None);

        sync.mount_region().unwrap();
        assert_eq!(sync.state(), SyncState::Subscribed);
    }

    #[test]
    fn test_progress_sequence_selects_expected_photos() {
        let mut sync = subscribed(&["p0", "p1", "p2", "p3"]);

        let picks: Vec<Option<usize>> = [0.0, 0.24, 0.5, 0.99, 1.0]
            .into_iter()
            .map(|p| {
                sync.observe(&at(p));
                sync.selection()
            })
            .collect();

        assert_eq!(picks, vec![Some(0), Some(0), Some(2), Some(3), Some(3)]);
        assert_eq!(sync.selected_photo().map(PhotoId::as_str), Some("p3"));
    }

    #[test]
    fn test_publishes_only_on_index_change() {
        let mut sync = subscribed(&["p0", "p1", "p2", "p3"]);
        let mut rx = sync.subscribe();

        sync.observe(&at(0.1));
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().index, Some(0));

        // Still inside the first photo's band
        sync.observe(&at(0.2));
        assert!(!rx.has_changed().unwrap());

        sync.observe(&at(0.3));
        assert!(rx.has_changed().unwrap());
        let published = rx.borrow_and_update().clone();
        assert_eq!(published.index, Some(1));
        assert_eq!(published.photo, Some(PhotoId::from("p1")));
    }

    #[test]
    fn test_refresh_resets_selection_before_new_one() {
        let mut sync = subscribed(&["p0", "p1", "p2", "p3"]);
        let mut rx = sync.subscribe();
        let first = sync.subscription_id();

        sync.observe(&at(0.8));
        assert_eq!(rx.borrow_and_update().index, Some(3));

        sync.set_catalog(catalog(&["q0", "q1"]));
        assert_eq!(sync.state(), SyncState::Subscribed);
        assert_ne!(sync.subscription_id(), first);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_none());
        assert_eq!(sync.selection(), None);

        // Same position, new catalog
        sync.observe(&at(0.8));
        let published = rx.borrow_and_update().clone();
        assert_eq!(published.index, Some(1));
        assert_eq!(published.photo, Some(PhotoId::from("q1")));
    }

    #[test]
    fn test_empty_catalog_detaches() {
        let mut sync = subscribed(&["p0", "p1"]);
        sync.observe(&at(0.7));
        assert_eq!(sync.selection(), Some(1));
        let old = sync.subscription_id().unwrap();

        sync.set_catalog(MediaCatalog::empty());
        assert_eq!(sync.state(), SyncState::Ready);
        assert_eq!(sync.selection(), None);
        assert_eq!(sync.subscription_id(), None);

        // Nothing reaches the selector until photos return
        sync.observe(&at(0.2));
        sync.handle_progress(old, ProgressEvent::Update(0.2));
        assert_eq!(sync.selection(), None);

        sync.set_catalog(catalog(&["p0", "p1"]));
        assert_eq!(sync.state(), SyncState::Subscribed);
        sync.observe(&at(0.2));
        assert_eq!(sync.selection(), Some(0));
    }

    #[test]
    fn test_stale_subscription_events_dropped() {
        let mut sync = subscribed(&["p0", "p1", "p2"]);
        let old = sync.subscription_id().unwrap();
        sync.set_catalog(catalog(&["p0", "p1", "p2"]));
        let current = sync.subscription_id().unwrap();

        sync.handle_progress(old, ProgressEvent::Update(0.9));
        assert_eq!(sync.selection(), None);

        sync.handle_progress(current, ProgressEvent::Update(0.9));
        assert_eq!(sync.selection(), Some(2));
    }

    #[test]
    fn test_out_of_range_progress_clamped() {
        let mut sync = subscribed(&["p0", "p1", "p2"]);
        let id = sync.subscription_id().unwrap();

        sync.handle_progress(id, ProgressEvent::Update(1.7));
        assert_eq!(sync.selection(), Some(2));
        sync.handle_progress(id, ProgressEvent::Update(-0.4));
        assert_eq!(sync.selection(), Some(0));
        sync.handle_progress(id, ProgressEvent::Update(f64::NAN));
        assert_eq!(sync.selection(), Some(0));
    }

    #[test]
    fn test_dispose_is_terminal() {
        let mut sync = subscribed(&["p0", "p1"]);
        let mut rx = sync.subscribe();
        let id = sync.subscription_id().unwrap();
        sync.observe(&at(0.9));
        rx.borrow_and_update();

        sync.dispose();
        assert_eq!(sync.state(), SyncState::Disposed);
        assert!(rx.borrow_and_update().is_none());

        sync.set_catalog(catalog(&["x"]));
        assert!(sync.mount_region().is_ok());
        sync.handle_progress(id, ProgressEvent::Update(0.1));
        sync.observe(&at(0.1));
        sync.settle();

        assert_eq!(sync.state(), SyncState::Disposed);
        assert!(sync.catalog().is_empty());
        assert_eq!(sync.selection(), None);
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_failed_refresh_after_dispose_has_no_effect() {
        let mut sync = subscribed(&["p0"]);
        let rx = sync.subscribe();
        sync.dispose();

        let late = sync.apply_refresh(Err(Error::StoreUnavailable("timeout".into())));
        assert!(late.is_ok());
        let late = sync.apply_refresh(Ok(catalog(&["p0", "p1"])));
        assert!(late.is_ok());

        assert_eq!(sync.state(), SyncState::Disposed);
        assert!(sync.catalog().is_empty());
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn test_failed_refresh_keeps_last_catalog() {
        let mut sync = subscribed(&["p0", "p1"]);
        sync.observe(&at(0.9));

        let err = sync
            .apply_refresh(Err(Error::StoreUnavailable("down".into())))
            .unwrap_err();
        assert!(err.is_soft());
        assert_eq!(sync.catalog().len(), 2);
        assert_eq!(sync.selection(), Some(1));
        assert_eq!(sync.state(), SyncState::Subscribed);
    }

    #[test]
    fn test_reveal_survives_resubscribe() {
        let mut sync = subscribed(&["p0", "p1"]);
        let now = Instant::now();

        assert_eq!(sync.observe_entries([0, 1], now), 2);
        assert!(sync.is_revealing(now));
        assert_eq!(sync.entry_style(2, now).opacity, 0.0);

        sync.set_catalog(catalog(&["p0", "p1", "p2"]));
        // Cancelled animations snap to shown and are not replayed
        assert!(sync.entry_style(0, now).is_visible());
        assert!(sync.entry_style(1, now).is_visible());
        assert_eq!(sync.observe_entries([0, 1, 2], now), 1);
        assert!(!sync.entry_style(2, now + Duration::from_millis(10)).is_visible());
    }

    #[test]
    fn test_entries_fully_shown_without_subscription() {
        let mut sync = controller();
        let now = Instant::now();
        assert_eq!(sync.observe_entries([0, 1, 2], now), 0);
        assert!(sync.entry_style(0, now).is_visible());
    }

    #[test]
    fn test_tracking_toggle() {
        let mut sync = subscribed(&["p0", "p1"]);
        sync.observe(&at(0.1));
        assert!(sync.is_scrolling());

        sync.set_tracking(false);
        assert!(!sync.is_scrolling());
        sync.observe(&at(0.9));
        assert_eq!(sync.selection(), Some(0));

        sync.set_tracking(true);
        sync.observe(&at(0.9));
        assert_eq!(sync.selection(), Some(1));
        sync.settle();
        assert!(!sync.is_scrolling());
    }

    #[test]
    fn test_progress_for_photo() {
        let sync = subscribed(&["p0", "p1", "p2", "p3"]);
        assert_eq!(sync.progress_for_photo(&PhotoId::from("p2")), Some(0.625));
        assert_eq!(sync.progress_for_photo(&PhotoId::from("zz")), None);
    }
}

//! Scroll progress observation for the timeline region

/// Position of the observed region relative to the viewport, in rows
///
/// `offset` is the scroll offset of the viewport in content coordinates and
/// `region_top` the content row where the region starts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegionGeometry {
    pub offset: f64,
    pub viewport: f64,
    pub region_top: f64,
    pub region_height: f64,
}

impl RegionGeometry {
    pub fn new(offset: f64, viewport: f64, region_top: f64, region_height: f64) -> Self {
        Self {
            offset,
            viewport,
            region_top,
            region_height,
        }
    }

    #[inline]
    pub fn has_extent(&self) -> bool {
        self.region_height > 0.0
    }

    /// Fraction of the region that has passed the reference line
    ///
    /// `reference` places the line as a fraction of the viewport height
    /// (0.5 = centre). The result is clamped to [0, 1]; a region without
    /// extent reports 0.
    pub fn progress(&self, reference: f64) -> f64 {
        if !self.has_extent() {
            return 0.0;
        }
        let line = self.offset + reference * self.viewport;
        let p = (line - self.region_top) / self.region_height;
        if p.is_nan() {
            0.0
        } else {
            p.clamp(0.0, 1.0)
        }
    }

    /// Scroll offset that puts the reference line at `progress` through the region
    pub fn offset_for(&self, progress: f64, reference: f64) -> f64 {
        self.region_top + progress.clamp(0.0, 1.0) * self.region_height - reference * self.viewport
    }
}

/// Lifecycle events of one continuous scroll interaction
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEvent {
    Start,
    Update(f64),
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceState {
    Disabled,
    Idle,
    Scrolling,
    /// Region has no extent; the single `Update(0)` has been reported
    Degenerate,
}

/// Turns region geometry samples into start/update/end progress events
///
/// A gesture starts with the first sample whose progress differs from the last
/// reported value and lasts until `settle()`. Repeated samples at the same
/// position emit nothing.
#[derive(Debug, Clone)]
pub struct ScrollProgressSource {
    reference: f64,
    state: SourceState,
    last_progress: Option<f64>,
}

impl ScrollProgressSource {
    /// Create an enabled source with the reference line at `reference` of the viewport
    pub fn new(reference: f64) -> Self {
        Self {
            reference: reference.clamp(0.0, 1.0),
            state: SourceState::Idle,
            last_progress: None,
        }
    }

    pub fn reference(&self) -> f64 {
        self.reference
    }

    #[inline]
    pub fn is_enabled(&self) -> bool {
        self.state != SourceState::Disabled
    }

    /// Whether a gesture is in progress
    #[inline]
    pub fn is_scrolling(&self) -> bool {
        self.state == SourceState::Scrolling
    }

    /// Last progress reported by this source
    pub fn last_progress(&self) -> Option<f64> {
        self.last_progress
    }

    /// Feed a geometry sample, appending any resulting events to `out`
    pub fn observe(&mut self, geometry: &RegionGeometry, out: &mut Vec<ProgressEvent>) {
        match self.state {
            SourceState::Disabled => return,
            SourceState::Degenerate if !geometry.has_extent() => return,
            _ => {}
        }

        if !geometry.has_extent() {
            if self.state == SourceState::Scrolling {
                out.push(ProgressEvent::End);
            }
            tracing::debug!("Observed region has no scrollable extent");
            out.push(ProgressEvent::Update(0.0));
            self.last_progress = Some(0.0);
            self.state = SourceState::Degenerate;
            return;
        }

        if self.state == SourceState::Degenerate {
            // Extent came back (e.g. after a resize); start fresh
            self.state = SourceState::Idle;
            self.last_progress = None;
        }

        let progress = geometry.progress(self.reference);
        if self.last_progress == Some(progress) {
            return;
        }

        if self.state == SourceState::Idle {
            out.push(ProgressEvent::Start);
            self.state = SourceState::Scrolling;
        }
        out.push(ProgressEvent::Update(progress));
        self.last_progress = Some(progress);
    }

    /// End the current gesture, if any
    pub fn settle(&mut self) -> Option<ProgressEvent> {
        if self.state == SourceState::Scrolling {
            self.state = SourceState::Idle;
            Some(ProgressEvent::End)
        } else {
            None
        }
    }

    /// Stop observing; a gesture in progress is ended
    pub fn disable(&mut self) -> Option<ProgressEvent> {
        let end = self.settle();
        self.state = SourceState::Disabled;
        self.last_progress = None;
        end
    }

    /// Resume observing; the next sample starts a new gesture
    pub fn enable(&mut self) {
        if self.state == SourceState::Disabled {
            self.state = SourceState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry(offset: f64) -> RegionGeometry {
        // 40-row region, 20-row viewport, padded by half a viewport above
        RegionGeometry::new(offset, 20.0, 10.0, 40.0)
    }

    fn observe(source: &mut ScrollProgressSource, offset: f64) -> Vec<ProgressEvent> {
        let mut out = Vec::new();
        source.observe(&geometry(offset), &mut out);
        out
    }

    #[test]
    fn test_progress_against_centre_line() {
        let g = geometry(0.0);
        assert_eq!(g.progress(0.5), 0.0);
        assert_eq!(geometry(20.0).progress(0.5), 0.5);
        assert_eq!(geometry(40.0).progress(0.5), 1.0);
        assert_eq!(geometry(55.0).progress(0.5), 1.0);
        assert_eq!(g.offset_for(0.5, 0.5), 20.0);
    }

    #[test]
    fn test_gesture_lifecycle() {
        let mut source = ScrollProgressSource::new(0.5);

        assert_eq!(
            observe(&mut source, 0.0),
            vec![ProgressEvent::Start, ProgressEvent::Update(0.0)]
        );
        assert_eq!(observe(&mut source, 10.0), vec![ProgressEvent::Update(0.25)]);
        // Same position, nothing new
        assert!(observe(&mut source, 10.0).is_empty());
        assert_eq!(source.settle(), Some(ProgressEvent::End));
        assert_eq!(source.settle(), None);

        // Scrolling back up starts a new gesture
        assert_eq!(
            observe(&mut source, 4.0),
            vec![ProgressEvent::Start, ProgressEvent::Update(0.1)]
        );
    }

    #[test]
    fn test_zero_extent_reports_once() {
        let mut source = ScrollProgressSource::new(0.5);
        let flat = RegionGeometry::new(0.0, 20.0, 0.0, 0.0);

        let mut out = Vec::new();
        source.observe(&flat, &mut out);
        source.observe(&flat, &mut out);
        source.observe(&RegionGeometry { offset: 3.0, ..flat }, &mut out);
        assert_eq!(out, vec![ProgressEvent::Update(0.0)]);
        assert_eq!(source.settle(), None);

        // Extent returns
        out.clear();
        source.observe(&geometry(20.0), &mut out);
        assert_eq!(out, vec![ProgressEvent::Start, ProgressEvent::Update(0.5)]);
    }

    #[test]
    fn test_disable_and_enable() {
        let mut source = ScrollProgressSource::new(0.5);
        observe(&mut source, 8.0);

        assert_eq!(source.disable(), Some(ProgressEvent::End));
        assert!(!source.is_enabled());
        assert!(observe(&mut source, 30.0).is_empty());

        source.enable();
        // Same position as before disabling is reported again
        assert_eq!(
            observe(&mut source, 8.0),
            vec![ProgressEvent::Start, ProgressEvent::Update(0.2)]
        );
    }
}

//! Smooth scroll offset animation for the timeline viewport

use std::time::{Duration, Instant};

use agescroll_core::sync::timing::{lerp_u16, progress_at};

use super::config::{EasingType, ScrollConfig, ScrollConfigExt};

#[derive(Debug, Clone)]
struct ActiveAnimation {
    start: Instant,
    from: u16,
    to: u16,
    duration: Duration,
    easing: EasingType,
}

/// Scroll animation controller
///
/// Call `scroll_by()`/`scroll_to()` on input, then `update()` each frame to
/// advance the interpolated offset. Scroll requests made within one frame are
/// batched into a single animation.
#[derive(Debug, Clone)]
pub struct ScrollAnimator {
    animation: Option<ActiveAnimation>,
    config: ScrollConfig,
    current_scroll: u16,
    /// Pending scroll delta for batching multiple scroll events
    pending_delta: i32,
}

impl Default for ScrollAnimator {
    fn default() -> Self {
        Self::new(ScrollConfig::default())
    }
}

impl ScrollAnimator {
    pub fn new(config: ScrollConfig) -> Self {
        Self {
            animation: None,
            config,
            current_scroll: 0,
            pending_delta: 0,
        }
    }

    pub fn config(&self) -> &ScrollConfig {
        &self.config
    }

    #[inline]
    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Whether there is work for the next frame (animation or pending delta)
    #[inline]
    pub fn needs_update(&self) -> bool {
        self.animation.is_some() || self.pending_delta != 0
    }

    /// Final position once the current animation completes
    pub fn target_scroll(&self) -> u16 {
        self.animation
            .as_ref()
            .map(|a| a.to)
            .unwrap_or(self.current_scroll)
    }

    #[inline]
    pub fn current_scroll(&self) -> u16 {
        self.current_scroll
    }

    /// Set scroll position immediately (no animation)
    pub fn set_scroll(&mut self, scroll: u16) {
        self.animation = None;
        self.current_scroll = scroll;
        self.pending_delta = 0;
    }

    /// Animate to an absolute position
    pub fn scroll_to(&mut self, target: u16, max_scroll: u16) {
        let target = target.min(max_scroll);
        self.pending_delta = 0;

        if !self.config.is_smooth() {
            self.current_scroll = target;
            self.animation = None;
            return;
        }

        if self.current_scroll == target {
            self.animation = None;
            return;
        }

        self.animation = Some(self.animation_to(target, Instant::now()));
    }

    /// Scroll by a delta (positive = down); batched until the next `update()`
    pub fn scroll_by(&mut self, delta: i32, max_scroll: u16) {
        if !self.config.is_smooth() {
            self.current_scroll = Self::offset(self.current_scroll, delta, max_scroll);
            self.animation = None;
            return;
        }

        self.pending_delta += delta;
    }

    /// Scroll down one step
    pub fn scroll_down(&mut self, max_scroll: u16) {
        let lines = self.step_lines();
        self.scroll_by(lines, max_scroll);
    }

    /// Scroll up one step
    pub fn scroll_up(&mut self, max_scroll: u16) {
        let lines = self.step_lines();
        self.scroll_by(-lines, max_scroll);
    }

    pub fn scroll_half_page_down(&mut self, viewport_height: u16, max_scroll: u16) {
        let half_page = (viewport_height / 2).max(1) as i32;
        self.scroll_by(half_page, max_scroll);
    }

    pub fn scroll_half_page_up(&mut self, viewport_height: u16, max_scroll: u16) {
        let half_page = (viewport_height / 2).max(1) as i32;
        self.scroll_by(-half_page, max_scroll);
    }

    pub fn scroll_full_page_down(&mut self, viewport_height: u16, max_scroll: u16) {
        self.scroll_by(viewport_height.max(1) as i32, max_scroll);
    }

    pub fn scroll_full_page_up(&mut self, viewport_height: u16, max_scroll: u16) {
        self.scroll_by(-(viewport_height.max(1) as i32), max_scroll);
    }

    /// Advance the animation and return the current offset
    pub fn update(&mut self, max_scroll: u16) -> u16 {
        self.update_at(Instant::now(), max_scroll)
    }

    /// Advance the animation to `now`
    pub fn update_at(&mut self, now: Instant, max_scroll: u16) -> u16 {
        if self.pending_delta != 0 {
            let new_target = Self::offset(self.target_scroll(), self.pending_delta, max_scroll);
            self.pending_delta = 0;

            if new_target != self.current_scroll {
                self.animation = Some(self.animation_to(new_target, now));
            } else {
                self.animation = None;
            }
        }

        if let Some(ref anim) = self.animation {
            let t = progress_at(anim.start, now, anim.duration);
            if t >= 1.0 {
                self.current_scroll = anim.to.min(max_scroll);
                self.animation = None;
            } else {
                let eased = anim.easing.apply(t);
                self.current_scroll = lerp_u16(anim.from, anim.to, eased).min(max_scroll);
            }
        } else {
            // Content may have shrunk (resize)
            self.current_scroll = self.current_scroll.min(max_scroll);
        }

        self.current_scroll
    }

    /// Stop at the current position
    pub fn cancel(&mut self) {
        self.animation = None;
        self.pending_delta = 0;
    }

    fn animation_to(&self, target: u16, start: Instant) -> ActiveAnimation {
        ActiveAnimation {
            start,
            from: self.current_scroll,
            to: target,
            duration: self.config.animation_duration(),
            easing: self.config.easing,
        }
    }

    fn step_lines(&self) -> i32 {
        if self.config.is_smooth() {
            1 // Smooth scroll moves 1 line at a time for fine control
        } else {
            self.config.scroll_lines.max(1) as i32
        }
    }

    fn offset(from: u16, delta: i32, max_scroll: u16) -> u16 {
        (from as i32 + delta).clamp(0, max_scroll as i32) as u16
    }
}

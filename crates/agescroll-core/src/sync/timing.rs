//! Time helpers shared by scroll and reveal animations

use std::time::{Duration, Instant};

/// Animation progress (0.0 to 1.0) at `now` for an animation started at `start`
///
/// Times before `start` report 0.0, a zero duration reports 1.0.
#[inline]
pub fn progress_at(start: Instant, now: Instant, duration: Duration) -> f64 {
    if duration.is_zero() {
        return 1.0;
    }
    let elapsed = now.saturating_duration_since(start);
    (elapsed.as_secs_f64() / duration.as_secs_f64()).clamp(0.0, 1.0)
}

#[inline]
pub fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + (to - from) * t
}

/// Linear interpolation for u16 values (scroll positions)
#[inline]
pub fn lerp_u16(from: u16, to: u16, t: f64) -> u16 {
    lerp(from as f64, to as f64, t).round() as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lerp() {
        assert!((lerp(0.0, 100.0, 0.5) - 50.0).abs() < 0.001);
        assert_eq!(lerp_u16(0, 100, 1.0), 100);
        assert_eq!(lerp_u16(40, 20, 0.5), 30);
    }

    #[test]
    fn test_progress_at() {
        let start = Instant::now();
        let d = Duration::from_millis(200);
        assert_eq!(progress_at(start, start, d), 0.0);
        assert!((progress_at(start, start + Duration::from_millis(50), d) - 0.25).abs() < 1e-9);
        assert_eq!(progress_at(start, start + Duration::from_secs(1), d), 1.0);
        // Not started yet
        assert_eq!(progress_at(start + d, start, d), 0.0);
    }

    #[test]
    fn test_progress_zero_duration() {
        let start = Instant::now();
        assert_eq!(progress_at(start, start, Duration::ZERO), 1.0);
    }
}

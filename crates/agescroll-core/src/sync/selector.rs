use std::num::NonZeroUsize;

/// Map scroll progress to a photo index
///
/// `floor(progress * len)`, with `progress == 1.0` landing on the last photo.
/// Progress outside [0, 1] saturates at the ends and NaN selects the first
/// photo, so the result is always a valid index.
#[inline]
pub fn select_frame(progress: f64, len: NonZeroUsize) -> usize {
    let last = len.get() - 1;
    let progress = if progress.is_nan() {
        0.0
    } else {
        progress.clamp(0.0, 1.0)
    };
    ((progress * len.get() as f64).floor() as usize).min(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(len: usize) -> NonZeroUsize {
        NonZeroUsize::new(len).unwrap()
    }

    #[test]
    fn test_scenario_four_photos() {
        let picks: Vec<usize> = [0.0, 0.24, 0.5, 0.99, 1.0]
            .into_iter()
            .map(|p| select_frame(p, n(4)))
            .collect();
        assert_eq!(picks, vec![0, 0, 2, 3, 3]);
    }

    #[test]
    fn test_endpoints() {
        for len in 1..=64 {
            assert_eq!(select_frame(0.0, n(len)), 0);
            assert_eq!(select_frame(1.0, n(len)), len - 1);
        }
    }

    #[test]
    fn test_always_in_range() {
        for len in 1..=32 {
            for step in 0..=1000 {
                let p = step as f64 / 1000.0;
                assert!(select_frame(p, n(len)) < len, "len={} p={}", len, p);
            }
        }
    }

    #[test]
    fn test_monotonic() {
        for len in [1, 2, 3, 7, 10, 33] {
            let mut prev = 0;
            for step in 0..=500 {
                let idx = select_frame(step as f64 / 500.0, n(len));
                assert!(idx >= prev, "len={} step={}", len, step);
                prev = idx;
            }
        }
    }

    #[test]
    fn test_overshoot_saturates() {
        assert_eq!(select_frame(-0.2, n(5)), 0);
        assert_eq!(select_frame(1.3, n(5)), 4);
        assert_eq!(select_frame(f64::NAN, n(5)), 0);
        assert_eq!(select_frame(f64::INFINITY, n(5)), 4);
    }
}

//! Smooth scrolling for the timeline viewport
//!
//! - `config` - configuration accessors (types re-exported from agescroll-core)
//! - `animation` - offset animator with batching and easing
//!
//! Easing curves and time helpers live in `agescroll_core::sync` so the
//! scroll animation and the entry reveal share them.

pub mod animation;
pub mod config;

pub use animation::ScrollAnimator;
pub use config::{EasingType, ScrollConfig, ScrollConfigExt};

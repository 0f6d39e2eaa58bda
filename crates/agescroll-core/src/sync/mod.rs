//! Scroll-to-photo synchronization engine
//!
//! - `selector` - pure progress to photo index mapping
//! - `progress` - region geometry and start/update/end progress events
//! - `reveal` - one-shot entrance animation of timeline entries
//! - `controller` - state machine owning the subscription and the selection
//! - `easing`, `timing` - animation curves and time helpers

pub mod easing;
pub mod timing;

mod controller;
mod progress;
mod reveal;
mod selector;

pub use controller::{Selection, SubscriptionId, SyncController, SyncState};
pub use easing::EasingType;
pub use progress::{ProgressEvent, RegionGeometry, ScrollProgressSource};
pub use reveal::{RevealStyle, TimelineRevealController};
pub use selector::select_frame;

pub mod config;
pub mod error;
pub mod media;
pub mod sync;

pub use config::{AppConfig, EasingType, RevealConfig, ScrollConfig};
pub use error::{Error, Result};
pub use media::{HttpMediaStore, MediaCatalog, MediaStore, PhotoId, TimelineEvent};
pub use sync::{Selection, SyncController, SyncState};

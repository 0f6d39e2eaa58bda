mod client;
mod models;
mod refresher;
mod store;

pub use client::HttpMediaStore;
pub use models::{MediaCatalog, PhotoId, TimelineEvent, UploadReceipt};
pub use refresher::{CatalogRefresh, CatalogRefresher, RefreshReason};
pub use store::MediaStore;

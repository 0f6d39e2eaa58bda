use std::path::PathBuf;

use bytes::Bytes;

use super::models::{MediaCatalog, PhotoId, UploadReceipt};
use crate::Result;

/// Remote image store holding the processed headshots
#[async_trait::async_trait]
pub trait MediaStore: Send + Sync {
    /// List available photos in chronological order
    ///
    /// Fails with `Error::StoreUnavailable` when the store cannot be reached.
    async fn list_photos(&self) -> Result<MediaCatalog>;

    /// Upload photo files for processing
    ///
    /// The catalog is not refreshed here; callers re-list on success.
    async fn upload_photos(&self, files: &[PathBuf]) -> Result<UploadReceipt>;

    /// Download the encoded image for a photo
    ///
    /// Fails with `Error::NotFound` for unknown ids.
    async fn fetch_photo(&self, id: &PhotoId) -> Result<Bytes>;
}

use std::collections::HashMap;
use std::sync::Arc;

use agescroll_core::{MediaCatalog, MediaStore, PhotoId};
use image::DynamicImage;
use tokio::sync::mpsc;

use crate::event::PhotoLoadResult;

/// Load state of one headshot
#[derive(Debug, Clone)]
pub enum PhotoEntry {
    Loading,
    Ready(Arc<DynamicImage>),
    Failed(String),
}

/// Decoded headshots keyed by photo id
#[derive(Debug, Default)]
pub struct PhotoCache {
    entries: HashMap<PhotoId, PhotoEntry>,
}

impl PhotoCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &PhotoId) -> Option<&PhotoEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Mark `id` as loading; returns false if it is already cached or in flight
    pub fn start_loading(&mut self, id: &PhotoId) -> bool {
        match self.entries.get(id) {
            Some(PhotoEntry::Loading) | Some(PhotoEntry::Ready(_)) => false,
            // Failed loads are retried when the photo is selected again
            Some(PhotoEntry::Failed(_)) | None => {
                self.entries.insert(id.clone(), PhotoEntry::Loading);
                true
            }
        }
    }

    /// Store the result of a background load
    ///
    /// Only photos still marked as loading accept a result; loads for photos
    /// pruned by a catalog refresh are dropped.
    pub fn finish(&mut self, result: PhotoLoadResult) -> bool {
        let (id, entry) = match result {
            PhotoLoadResult::Success { id, image } => (id, PhotoEntry::Ready(Arc::new(image))),
            PhotoLoadResult::Failure { id, error } => (id, PhotoEntry::Failed(error)),
        };
        match self.entries.get_mut(&id) {
            Some(slot) if matches!(slot, PhotoEntry::Loading) => {
                *slot = entry;
                true
            }
            _ => {
                tracing::trace!(photo = %id, "Dropping load result for untracked photo");
                false
            }
        }
    }

    /// Drop photos that are no longer in the catalog
    pub fn retain(&mut self, catalog: &MediaCatalog) {
        self.entries.retain(|id, _| catalog.position(id).is_some());
    }
}

/// Fetch and decode a headshot in the background
pub fn spawn_photo_load(
    store: Arc<dyn MediaStore>,
    id: PhotoId,
    tx: mpsc::UnboundedSender<PhotoLoadResult>,
) {
    tokio::spawn(async move {
        let result = match store.fetch_photo(&id).await {
            Ok(bytes) => {
                // Decoding is CPU-bound
                let decoded =
                    tokio::task::spawn_blocking(move || image::load_from_memory(&bytes)).await;
                match decoded {
                    Ok(Ok(image)) => PhotoLoadResult::Success { id, image },
                    Ok(Err(e)) => PhotoLoadResult::Failure {
                        id,
                        error: format!("Failed to decode image: {}", e),
                    },
                    Err(e) => PhotoLoadResult::Failure {
                        id,
                        error: format!("Decode task failed: {}", e),
                    },
                }
            }
            Err(e) => PhotoLoadResult::Failure {
                id,
                error: e.to_string(),
            },
        };

        if let PhotoLoadResult::Failure { ref id, ref error } = result {
            tracing::warn!(photo = %id, "Photo load failed: {}", error);
        }
        let _ = tx.send(result);
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PhotoId {
        PhotoId::from(s)
    }

    #[test]
    fn test_start_loading_once() {
        let mut cache = PhotoCache::new();
        assert!(cache.start_loading(&id("a.jpg")));
        assert!(!cache.start_loading(&id("a.jpg")));

        cache.finish(PhotoLoadResult::Failure {
            id: id("a.jpg"),
            error: "Image not found".into(),
        });
        assert!(matches!(cache.get(&id("a.jpg")), Some(PhotoEntry::Failed(_))));
        // Failed entries may be retried
        assert!(cache.start_loading(&id("a.jpg")));
    }

    #[test]
    fn test_ready_not_reloaded() {
        let mut cache = PhotoCache::new();
        cache.start_loading(&id("a.jpg"));
        cache.finish(PhotoLoadResult::Success {
            id: id("a.jpg"),
            image: DynamicImage::new_rgb8(2, 2),
        });
        assert!(matches!(cache.get(&id("a.jpg")), Some(PhotoEntry::Ready(_))));
        assert!(!cache.start_loading(&id("a.jpg")));
    }

    #[test]
    fn test_retain_catalog() {
        let mut cache = PhotoCache::new();
        cache.start_loading(&id("a.jpg"));
        cache.start_loading(&id("b.jpg"));

        let catalog: MediaCatalog = [id("b.jpg")].into_iter().collect();
        cache.retain(&catalog);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(&id("a.jpg")).is_none());
    }

    #[test]
    fn test_late_result_for_pruned_photo_dropped() {
        let mut cache = PhotoCache::new();
        cache.start_loading(&id("a.jpg"));
        cache.start_loading(&id("b.jpg"));

        let catalog: MediaCatalog = [id("b.jpg")].into_iter().collect();
        cache.retain(&catalog);

        // a.jpg was removed from the store while its fetch was in flight
        assert!(!cache.finish(PhotoLoadResult::Success {
            id: id("a.jpg"),
            image: DynamicImage::new_rgb8(2, 2),
        }));
        assert!(cache.get(&id("a.jpg")).is_none());
        assert_eq!(cache.len(), 1);

        assert!(cache.finish(PhotoLoadResult::Failure {
            id: id("b.jpg"),
            error: "Image not found".into(),
        }));
        assert!(matches!(cache.get(&id("b.jpg")), Some(PhotoEntry::Failed(_))));
    }

    #[test]
    fn test_unrequested_result_ignored() {
        let mut cache = PhotoCache::new();
        assert!(!cache.finish(PhotoLoadResult::Success {
            id: id("a.jpg"),
            image: DynamicImage::new_rgb8(2, 2),
        }));
        assert_eq!(cache.len(), 0);
    }
}

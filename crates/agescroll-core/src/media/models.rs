use std::collections::HashSet;
use std::fmt;
use std::num::NonZeroUsize;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::sync::select_frame;
use crate::{Error, Result};

/// Opaque identifier of a processed photo in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(String);

impl PhotoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PhotoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhotoId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for PhotoId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered, immutable snapshot of the photos available for the timeline
///
/// Position in the catalog is chronological position. A refresh replaces the
/// whole snapshot; there are no mutating methods.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaCatalog {
    photos: Arc<[PhotoId]>,
}

impl MediaCatalog {
    /// Build a catalog, keeping the first occurrence of any duplicated id
    pub fn new(photos: impl IntoIterator<Item = PhotoId>) -> Self {
        let mut seen = HashSet::new();
        let mut ordered = Vec::new();
        for photo in photos {
            if seen.insert(photo.clone()) {
                ordered.push(photo);
            } else {
                tracing::warn!(photo = %photo, "Duplicate photo id in catalog, dropping");
            }
        }
        Self {
            photos: ordered.into(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.photos.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.photos.is_empty()
    }

    /// Length as a non-zero count, `None` for an empty catalog
    #[inline]
    pub fn non_zero_len(&self) -> Option<NonZeroUsize> {
        NonZeroUsize::new(self.photos.len())
    }

    pub fn get(&self, index: usize) -> Option<&PhotoId> {
        self.photos.get(index)
    }

    pub fn position(&self, id: &PhotoId) -> Option<usize> {
        self.photos.iter().position(|p| p == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PhotoId> {
        self.photos.iter()
    }

    pub fn as_slice(&self) -> &[PhotoId] {
        &self.photos
    }

    /// Select the photo for a scroll progress value
    pub fn select(&self, progress: f64) -> Result<(usize, &PhotoId)> {
        let len = self.non_zero_len().ok_or(Error::NoMediaAvailable)?;
        let index = select_frame(progress, len);
        Ok((index, &self.photos[index]))
    }
}

impl FromIterator<PhotoId> for MediaCatalog {
    fn from_iter<I: IntoIterator<Item = PhotoId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// A life event shown on the timeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub year: i32,
    pub description: String,
    /// Photo pinned to this event, independent of catalog order
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<PhotoId>,
}

impl TimelineEvent {
    pub fn new(year: i32, description: impl Into<String>) -> Self {
        Self {
            year,
            description: description.into(),
            photo: None,
        }
    }

    pub fn with_photo(mut self, photo: impl Into<PhotoId>) -> Self {
        self.photo = Some(photo.into());
        self
    }
}

/// Store response to an upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
}

/// Wire shape of the catalog listing
#[derive(Debug, Deserialize)]
pub(crate) struct ImageListing {
    pub images: Vec<PhotoId>,
}

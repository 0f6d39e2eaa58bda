use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::models::MediaCatalog;
use super::store::MediaStore;
use crate::Result;

/// Why a catalog refresh was started
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshReason {
    /// First listing when the timeline mounts
    Initial,
    /// User asked for a refresh
    Manual,
    /// Listing after a successful upload of this many files
    AfterUpload { uploaded: usize },
}

/// Completion of a background catalog refresh
#[derive(Debug)]
pub struct CatalogRefresh {
    pub generation: u64,
    pub reason: RefreshReason,
    pub outcome: Result<MediaCatalog>,
}

/// Runs catalog listings on tokio tasks and delivers their results over a channel
///
/// Results are delivered as discrete events; nothing here blocks the UI loop.
/// Shutting down (or dropping) the refresher cancels in-flight tasks before
/// they report.
pub struct CatalogRefresher {
    store: Arc<dyn MediaStore>,
    tx: mpsc::UnboundedSender<CatalogRefresh>,
    shutdown: watch::Sender<bool>,
    generation: u64,
}

impl CatalogRefresher {
    pub fn new(store: Arc<dyn MediaStore>, tx: mpsc::UnboundedSender<CatalogRefresh>) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            store,
            tx,
            shutdown,
            generation: 0,
        }
    }

    /// Generation of the most recently started refresh
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether a completed refresh is the latest one started
    pub fn is_current(&self, refresh: &CatalogRefresh) -> bool {
        refresh.generation == self.generation
    }

    pub fn is_shut_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Start listing the catalog
    pub fn refresh(&mut self, reason: RefreshReason) -> u64 {
        let store = Arc::clone(&self.store);
        self.spawn(reason, async move { store.list_photos().await })
    }

    /// Upload files, then list the catalog if the upload succeeded
    pub fn upload_and_refresh(&mut self, files: Vec<PathBuf>) -> u64 {
        let store = Arc::clone(&self.store);
        let uploaded = files.len();
        self.spawn(RefreshReason::AfterUpload { uploaded }, async move {
            let receipt = store.upload_photos(&files).await?;
            info!("Upload finished: {}", receipt.message);
            store.list_photos().await
        })
    }

    fn spawn<F>(&mut self, reason: RefreshReason, task: F) -> u64
    where
        F: std::future::Future<Output = Result<MediaCatalog>> + Send + 'static,
    {
        if self.is_shut_down() {
            debug!("Refresher shut down, ignoring refresh request");
            return self.generation;
        }

        self.generation += 1;
        let generation = self.generation;
        let tx = self.tx.clone();
        let mut shutdown = self.shutdown.subscribe();

        debug!(generation, ?reason, "Starting catalog refresh");

        tokio::spawn(async move {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!(generation, "Catalog refresh cancelled");
                }
                outcome = task => {
                    if let Err(ref e) = outcome {
                        warn!(generation, error = %e, "Catalog refresh failed");
                    }
                    if tx.send(CatalogRefresh { generation, reason, outcome }).is_err() {
                        debug!(generation, "Catalog refresh finished after receiver dropped");
                    }
                }
            }
        });

        generation
    }

    /// Cancel in-flight refreshes; later requests are ignored
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }
}

impl Drop for CatalogRefresher {
    fn drop(&mut self) {
        self.shutdown();
    }
}

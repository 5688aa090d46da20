//! Concurrent refresh coordination
//!
//! The pull-to-refresh counterpart of the per-store `refetch`: registered
//! stores are refreshed concurrently and a single flag reports whether a
//! sweep is in progress.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::future::join_all;

use super::{PhotosStore, ProjectsStore};

/// Anything the refresher can sweep.
#[async_trait]
pub trait Refreshable: Send + Sync {
    async fn refetch(&self);
}

#[async_trait]
impl Refreshable for ProjectsStore {
    async fn refetch(&self) {
        ProjectsStore::refetch(self).await;
    }
}

#[async_trait]
impl Refreshable for PhotosStore {
    async fn refetch(&self) {
        PhotosStore::refetch(self).await;
    }
}

#[derive(Default)]
pub struct Refresher {
    targets: Mutex<Vec<Arc<dyn Refreshable>>>,
    refreshing: AtomicBool,
}

impl Refresher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, target: Arc<dyn Refreshable>) {
        self.targets.lock().unwrap().push(target);
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing.load(Ordering::SeqCst)
    }

    /// Refetch every registered store concurrently.
    pub async fn refresh_all(&self) {
        self.refreshing.store(true, Ordering::SeqCst);
        let targets: Vec<Arc<dyn Refreshable>> = self.targets.lock().unwrap().clone();
        join_all(targets.iter().map(|target| target.refetch())).await;
        self.refreshing.store(false, Ordering::SeqCst);
    }
}

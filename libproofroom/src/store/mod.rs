//! Collection stores: fetch, cache in memory, and mutate domain entities
//!
//! A store owns the full in-memory list of entities it most recently
//! fetched, plus a loading flag and an optional error message. `refetch`
//! replaces the collection wholesale (never merges); a failed refetch keeps
//! the previous collection visible and records the classified error message.
//! Mutations apply a local transformation after the server accepts the
//! request, without a re-fetch, and every mutation reports its outcome as a
//! [`MutationOutcome`].
//!
//! # Overlapping refetches
//!
//! Each store carries a monotonically increasing request sequence number. A
//! settling request, success or failure, applies its outcome only if its
//! sequence value is still the newest issued, so a slow stale response can
//! never clobber the state a newer one produced.

pub mod photos;
pub mod projects;
pub mod refresher;

pub use photos::PhotosStore;
pub use projects::ProjectsStore;
pub use refresher::{Refreshable, Refresher};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::error::ErrorInfo;

/// Discriminated result of a store mutation.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    /// The server accepted the request and the local collection reflects it.
    Applied(T),
    /// The request failed; the collection is unchanged.
    Rejected(ErrorInfo),
}

impl<T> MutationOutcome<T> {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied(_))
    }

    pub fn applied(self) -> Option<T> {
        match self {
            MutationOutcome::Applied(value) => Some(value),
            MutationOutcome::Rejected(_) => None,
        }
    }

    pub fn rejected(self) -> Option<ErrorInfo> {
        match self {
            MutationOutcome::Applied(_) => None,
            MutationOutcome::Rejected(error) => Some(error),
        }
    }
}

/// Point-in-time view of a store's state.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreSnapshot<T> {
    /// The collection in server order.
    pub items: Vec<T>,
    pub is_loading: bool,
    pub error: Option<String>,
}

impl<T> StoreSnapshot<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

struct Inner<T> {
    items: Vec<T>,
    is_loading: bool,
    error: Option<String>,
}

/// Shared fetch-state machinery used by both stores.
///
/// Critical sections are short and never held across an await; the sequence
/// counter lives outside the lock so stale checks don't contend with readers.
pub(crate) struct FetchState<T> {
    inner: Arc<RwLock<Inner<T>>>,
    seq: AtomicU64,
}

impl<T: Clone> FetchState<T> {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(Inner {
                items: Vec::new(),
                is_loading: false,
                error: None,
            })),
            seq: AtomicU64::new(0),
        }
    }

    pub(crate) async fn snapshot(&self) -> StoreSnapshot<T> {
        let inner = self.inner.read().await;
        StoreSnapshot {
            items: inner.items.clone(),
            is_loading: inner.is_loading,
            error: inner.error.clone(),
        }
    }

    /// Start a request: bump the sequence, raise the loading flag, clear the
    /// error. Returns the sequence value the settling call must present.
    pub(crate) async fn begin(&self) -> u64 {
        let seq = self.seq.fetch_add(1, Ordering::SeqCst) + 1;
        let mut inner = self.inner.write().await;
        inner.is_loading = true;
        inner.error = None;
        seq
    }

    /// Settle a successful request. Replaces the collection wholesale and
    /// clears the loading flag, unless a newer request has been issued
    /// since; then the response is discarded and `false` is returned.
    pub(crate) async fn settle_ok(&self, seq: u64, items: Vec<T>) -> bool {
        if self.seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        let mut inner = self.inner.write().await;
        inner.items = items;
        inner.is_loading = false;
        inner.error = None;
        true
    }

    /// Settle a failed request. Records the message and clears the loading
    /// flag, leaving the previous collection untouched. Stale failures are
    /// discarded the same way stale successes are.
    pub(crate) async fn settle_err(&self, seq: u64, message: String) -> bool {
        if self.seq.load(Ordering::SeqCst) != seq {
            return false;
        }
        let mut inner = self.inner.write().await;
        inner.is_loading = false;
        inner.error = Some(message);
        true
    }

    /// Apply a local transformation to the collection (mutation path).
    pub(crate) async fn mutate<F>(&self, f: F)
    where
        F: FnOnce(&mut Vec<T>),
    {
        let mut inner = self.inner.write().await;
        f(&mut inner.items);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_initial_snapshot() {
        let state: FetchState<u32> = FetchState::new();
        let snapshot = state.snapshot().await;
        assert!(snapshot.items.is_empty());
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_begin_raises_loading_and_clears_error() {
        let state: FetchState<u32> = FetchState::new();
        let seq = state.begin().await;
        state.settle_err(seq, "boom".to_string()).await;
        assert_eq!(state.snapshot().await.error, Some("boom".to_string()));

        let _ = state.begin().await;
        let snapshot = state.snapshot().await;
        assert!(snapshot.is_loading);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_settle_ok_replaces_wholesale() {
        let state: FetchState<u32> = FetchState::new();

        let seq = state.begin().await;
        assert!(state.settle_ok(seq, vec![1, 2, 3]).await);

        let seq = state.begin().await;
        assert!(state.settle_ok(seq, vec![4]).await);

        // Stale entries absent from the response dropped out.
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.items, vec![4]);
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_settle_err_keeps_previous_items() {
        let state: FetchState<u32> = FetchState::new();
        let seq = state.begin().await;
        state.settle_ok(seq, vec![1, 2]).await;

        let seq = state.begin().await;
        assert!(state.settle_err(seq, "server down".to_string()).await);

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.items, vec![1, 2]);
        assert!(!snapshot.is_loading);
        assert_eq!(snapshot.error, Some("server down".to_string()));
    }

    #[tokio::test]
    async fn test_stale_success_is_discarded() {
        let state: FetchState<u32> = FetchState::new();

        let first = state.begin().await;
        let second = state.begin().await;

        // The newer request settles first.
        assert!(state.settle_ok(second, vec![2]).await);
        // The older one resolves late and must not apply.
        assert!(!state.settle_ok(first, vec![1]).await);

        assert_eq!(state.snapshot().await.items, vec![2]);
    }

    #[tokio::test]
    async fn test_stale_failure_is_discarded() {
        let state: FetchState<u32> = FetchState::new();

        let first = state.begin().await;
        let second = state.begin().await;

        assert!(state.settle_ok(second, vec![2]).await);
        assert!(!state.settle_err(first, "late failure".to_string()).await);

        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.items, vec![2]);
        assert_eq!(snapshot.error, None);
    }

    #[tokio::test]
    async fn test_stale_settle_does_not_clear_loading() {
        let state: FetchState<u32> = FetchState::new();

        let first = state.begin().await;
        let _second = state.begin().await;

        // The older request settles while the newer one is still in flight.
        assert!(!state.settle_ok(first, vec![1]).await);
        assert!(state.snapshot().await.is_loading);
    }

    #[tokio::test]
    async fn test_mutate_transforms_in_place() {
        let state: FetchState<u32> = FetchState::new();
        let seq = state.begin().await;
        state.settle_ok(seq, vec![1, 2, 3]).await;

        state.mutate(|items| items.retain(|i| *i != 2)).await;
        assert_eq!(state.snapshot().await.items, vec![1, 3]);
    }

    #[test]
    fn test_mutation_outcome_accessors() {
        let applied: MutationOutcome<u32> = MutationOutcome::Applied(7);
        assert!(applied.is_applied());
        assert_eq!(applied.applied(), Some(7));

        let rejected: MutationOutcome<u32> = MutationOutcome::Rejected(ErrorInfo {
            kind: ErrorKind::Server,
            message: "boom".to_string(),
            code: Some(500),
        });
        assert!(!rejected.is_applied());
        assert_eq!(rejected.rejected().unwrap().code, Some(500));
    }
}

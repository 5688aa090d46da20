//! Photo collection store

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::ProofroomApi;
use crate::error::{ErrorInfo, ErrorKind};
use crate::service::events::{EventBus, StoreEvent};
use crate::types::Photo;

use super::{FetchState, MutationOutcome, StoreSnapshot};

/// Identifying parameters a photo store fetches under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoScope {
    pub project_id: String,
    pub folder_id: Option<String>,
}

impl PhotoScope {
    pub fn project(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            folder_id: None,
        }
    }

    pub fn folder(project_id: impl Into<String>, folder_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            folder_id: Some(folder_id.into()),
        }
    }
}

/// Store for the photos of one project, optionally narrowed to a folder.
pub struct PhotosStore {
    api: Arc<dyn ProofroomApi>,
    events: EventBus,
    state: FetchState<Photo>,
    scope: RwLock<PhotoScope>,
}

impl PhotosStore {
    pub(crate) fn new(api: Arc<dyn ProofroomApi>, events: EventBus, scope: PhotoScope) -> Self {
        Self {
            api,
            events,
            state: FetchState::new(),
            scope: RwLock::new(scope),
        }
    }

    pub async fn scope(&self) -> PhotoScope {
        self.scope.read().await.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot<Photo> {
        self.state.snapshot().await
    }

    /// Fetch the photo list for the current scope and replace the collection.
    ///
    /// Same settle rules as the projects store: failures keep the previous
    /// collection, superseded responses are discarded.
    pub async fn refetch(&self) {
        let seq = self.state.begin().await;
        let scope = self.scope().await;

        match self
            .api
            .list_photos(&scope.project_id, scope.folder_id.as_deref())
            .await
        {
            Ok(response) => {
                let count = response.photos.len();
                if self.state.settle_ok(seq, response.photos).await {
                    self.events.emit(StoreEvent::PhotosRefreshed {
                        project_id: scope.project_id,
                        count,
                    });
                } else {
                    tracing::debug!("Discarding stale photo list response");
                }
            }
            Err(e) => {
                let error = ErrorInfo::from_api_error(&e);
                if self.state.settle_err(seq, error.message.clone()).await {
                    tracing::warn!("Photo refetch failed: {}", error.message);
                    self.events.emit(StoreEvent::RefreshFailed {
                        source: "photos".to_string(),
                        error,
                    });
                } else {
                    tracing::debug!("Discarding stale photo list failure");
                }
            }
        }
    }

    /// Replace the identifying parameters and refetch under them.
    pub async fn set_scope(&self, scope: PhotoScope) {
        *self.scope.write().await = scope;
        self.refetch().await;
    }

    /// Toggle a photo's favorite flag, reconciling the collection in place.
    ///
    /// The server may answer with the updated photo or with no content; with
    /// a body the local entry is replaced by it, without one the flag is
    /// inverted locally. Order and all other photos are untouched.
    pub async fn toggle_favorite(&self, photo_id: &str) -> MutationOutcome<Photo> {
        match self.api.toggle_favorite(photo_id).await {
            Ok(server_photo) => {
                let mut updated: Option<Photo> = None;
                self.state
                    .mutate(|items| {
                        if let Some(photo) = items.iter_mut().find(|p| p.id == photo_id) {
                            match &server_photo {
                                Some(reconciled) => *photo = reconciled.clone(),
                                None => photo.toggle_favorite(),
                            }
                            updated = Some(photo.clone());
                        }
                    })
                    .await;

                match updated.or(server_photo) {
                    Some(photo) => {
                        self.events.emit(StoreEvent::FavoriteToggled {
                            photo_id: photo.id.clone(),
                            is_favorite: photo.is_favorite,
                        });
                        MutationOutcome::Applied(photo)
                    }
                    None => {
                        // Server toggled, but we hold no copy to reflect it in.
                        tracing::warn!("Photo {} is not in the loaded collection", photo_id);
                        MutationOutcome::Rejected(ErrorInfo {
                            kind: ErrorKind::Unknown,
                            message: format!(
                                "Photo {} is not in the loaded collection.",
                                photo_id
                            ),
                            code: None,
                        })
                    }
                }
            }
            Err(e) => {
                let error = ErrorInfo::from_api_error(&e);
                tracing::warn!("Favorite toggle failed: {}", error.message);
                MutationOutcome::Rejected(error)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockApi;
    use crate::error::ApiError;

    fn fixtures() -> Vec<Photo> {
        vec![
            Photo::new("ph-1", "proj-1"),
            Photo::new("ph-2", "proj-1").in_folder("folder-1"),
            Photo::new("ph-3", "proj-1"),
        ]
    }

    fn store_over(mock: Arc<MockApi>, scope: PhotoScope) -> PhotosStore {
        PhotosStore::new(mock, EventBus::new(16), scope)
    }

    #[tokio::test]
    async fn test_refetch_loads_project_photos() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(mock, PhotoScope::project("proj-1"));

        store.refetch().await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.items.len(), 3);
        assert_eq!(snapshot.items[0].id, "ph-1");
        assert!(!snapshot.is_loading);
    }

    #[tokio::test]
    async fn test_refetch_narrowed_to_folder() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(mock, PhotoScope::folder("proj-1", "folder-1"));

        store.refetch().await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.items.len(), 1);
        assert_eq!(snapshot.items[0].id, "ph-2");
    }

    #[tokio::test]
    async fn test_set_scope_refetches() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(Arc::clone(&mock), PhotoScope::project("proj-1"));

        store.refetch().await;
        store.set_scope(PhotoScope::folder("proj-1", "folder-1")).await;

        assert_eq!(store.snapshot().await.items.len(), 1);
        assert_eq!(mock.call_count("list_photos"), 2);
    }

    #[tokio::test]
    async fn test_toggle_favorite_inverts_in_place() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(mock, PhotoScope::project("proj-1"));
        store.refetch().await;

        let outcome = store.toggle_favorite("ph-1").await;
        let updated = outcome.applied().expect("toggle should apply");
        assert!(updated.is_favorite);

        let snapshot = store.snapshot().await;
        assert!(snapshot.items[0].is_favorite);
        // All other photos unchanged, order preserved.
        assert!(!snapshot.items[1].is_favorite);
        assert!(!snapshot.items[2].is_favorite);
        assert_eq!(
            snapshot.items.iter().map(|p| p.id.as_str()).collect::<Vec<_>>(),
            vec!["ph-1", "ph-2", "ph-3"]
        );
    }

    #[tokio::test]
    async fn test_toggle_favorite_without_body_inverts_locally() {
        let mock =
            Arc::new(MockApi::with_photos(fixtures()).without_favorite_body());
        let store = store_over(mock, PhotoScope::project("proj-1"));
        store.refetch().await;

        let outcome = store.toggle_favorite("ph-3").await;
        assert!(outcome.applied().unwrap().is_favorite);
        assert!(store.snapshot().await.items[2].is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_favorite_twice_restores_the_flag() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(mock, PhotoScope::project("proj-1"));
        store.refetch().await;

        store.toggle_favorite("ph-1").await;
        store.toggle_favorite("ph-1").await;
        assert!(!store.snapshot().await.items[0].is_favorite);
    }

    #[tokio::test]
    async fn test_toggle_favorite_failure_is_reported_not_swallowed() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(Arc::clone(&mock), PhotoScope::project("proj-1"));
        store.refetch().await;

        mock.set_failure(Some(ApiError::Connect("refused".to_string())));
        let outcome = store.toggle_favorite("ph-1").await;

        let error = outcome.rejected().expect("toggle should be rejected");
        assert_eq!(error.kind, ErrorKind::Network);
        assert!(!store.snapshot().await.items[0].is_favorite);
    }

    #[tokio::test]
    async fn test_refetch_failure_keeps_photos_visible() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let store = store_over(Arc::clone(&mock), PhotoScope::project("proj-1"));
        store.refetch().await;

        mock.set_failure(Some(ApiError::Timeout("elapsed".to_string())));
        store.refetch().await;

        let snapshot = store.snapshot().await;
        assert_eq!(snapshot.items.len(), 3);
        assert!(snapshot.error.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_toggle_favorite_emits_event() {
        let mock = Arc::new(MockApi::with_photos(fixtures()));
        let events = EventBus::new(16);
        let mut receiver = events.subscribe();
        let store = PhotosStore::new(mock, events, PhotoScope::project("proj-1"));
        store.refetch().await;

        // Skip the refresh event.
        let _ = receiver.recv().await.unwrap();
        store.toggle_favorite("ph-2").await;

        match receiver.recv().await.unwrap() {
            StoreEvent::FavoriteToggled { photo_id, is_favorite } => {
                assert_eq!(photo_id, "ph-2");
                assert!(is_favorite);
            }
            other => panic!("Wrong event: {:?}", other),
        }
    }
}

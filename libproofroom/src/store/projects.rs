//! Project collection store

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::api::ProofroomApi;
use crate::error::ErrorInfo;
use crate::service::events::{EventBus, StoreEvent};
use crate::types::{CreateProjectRequest, Project};

use super::{FetchState, MutationOutcome, StoreSnapshot};

/// Store for the project collection, optionally scoped to one client.
///
/// Owns its collection exclusively; no other store shares it. Construct
/// through [`crate::service::ProofroomService::projects`].
pub struct ProjectsStore {
    api: Arc<dyn ProofroomApi>,
    events: EventBus,
    state: FetchState<Project>,
    client_id: RwLock<Option<String>>,
}

impl ProjectsStore {
    pub(crate) fn new(
        api: Arc<dyn ProofroomApi>,
        events: EventBus,
        client_id: Option<String>,
    ) -> Self {
        Self {
            api,
            events,
            state: FetchState::new(),
            client_id: RwLock::new(client_id),
        }
    }

    /// The client scope this store currently fetches under.
    pub async fn client_id(&self) -> Option<String> {
        self.client_id.read().await.clone()
    }

    pub async fn snapshot(&self) -> StoreSnapshot<Project> {
        self.state.snapshot().await
    }

    /// Fetch the project list and replace the collection wholesale.
    ///
    /// On failure the previous collection stays visible and the classified
    /// error message is recorded. A response superseded by a newer refetch is
    /// discarded either way.
    pub async fn refetch(&self) {
        let seq = self.state.begin().await;
        let client_id = self.client_id().await;

        match self.api.list_projects(client_id.as_deref()).await {
            Ok(response) => {
                let count = response.projects.len();
                if self.state.settle_ok(seq, response.projects).await {
                    tracing::debug!("Loaded {} of {} projects", count, response.total);
                    self.events.emit(StoreEvent::ProjectsRefreshed { count });
                } else {
                    tracing::debug!("Discarding stale project list response");
                }
            }
            Err(e) => {
                let error = ErrorInfo::from_api_error(&e);
                if self.state.settle_err(seq, error.message.clone()).await {
                    tracing::warn!("Project refetch failed: {}", error.message);
                    self.events.emit(StoreEvent::RefreshFailed {
                        source: "projects".to_string(),
                        error,
                    });
                } else {
                    tracing::debug!("Discarding stale project list failure");
                }
            }
        }
    }

    /// Replace the client scope and refetch under it.
    pub async fn set_scope(&self, client_id: Option<String>) {
        *self.client_id.write().await = client_id;
        self.refetch().await;
    }

    /// Create a project and prepend it to the collection. No re-fetch.
    pub async fn create_project(
        &self,
        title: &str,
        client_id: Option<&str>,
    ) -> MutationOutcome<Project> {
        let request = CreateProjectRequest {
            title: title.to_string(),
            client_id: client_id.map(str::to_string),
        };

        match self.api.create_project(&request).await {
            Ok(project) => {
                let created = project.clone();
                self.state.mutate(|items| items.insert(0, created)).await;
                self.events.emit(StoreEvent::ProjectCreated {
                    project_id: project.id.clone(),
                    title: project.title.clone(),
                });
                MutationOutcome::Applied(project)
            }
            Err(e) => {
                let error = ErrorInfo::from_api_error(&e);
                tracing::warn!("Project creation failed: {}", error.message);
                MutationOutcome::Rejected(error)
            }
        }
    }

    /// Delete a project and filter it out of the collection. No re-fetch.
    pub async fn delete_project(&self, project_id: &str) -> MutationOutcome<String> {
        match self.api.delete_project(project_id).await {
            Ok(()) => {
                let id = project_id.to_string();
                self.state.mutate(|items| items.retain(|p| p.id != id)).await;
                self.events.emit(StoreEvent::ProjectDeleted {
                    project_id: id.clone(),
                });
                MutationOutcome::Applied(id)
            }
            Err(e) => {
                let error = ErrorInfo::from_api_error(&e);
                tracing::warn!("Project deletion failed: {}", error.message);
                MutationOutcome::Rejected(error)
            }
        }
    }
}

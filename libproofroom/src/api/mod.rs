//! API client seam for the studio's REST endpoints
//!
//! [`ProofroomApi`] is the trait the collection stores fetch and mutate
//! through. [`HttpApi`] talks to a real server; [`MockApi`] is an in-memory
//! fixture implementation for tests and offline development.

pub mod http;
pub mod mock;

pub use http::HttpApi;
pub use mock::MockApi;

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{CreateProjectRequest, PhotoListResponse, Photo, Project, ProjectListResponse};

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The REST surface consumed by the data layer.
///
/// One method per endpoint. Reads are idempotent and may be retried by the
/// implementation; writes must be issued exactly once.
#[async_trait]
pub trait ProofroomApi: Send + Sync {
    /// GET `/api/projects/`, optionally scoped to one client.
    async fn list_projects(&self, client_id: Option<&str>) -> ApiResult<ProjectListResponse>;

    /// POST `/api/projects/`.
    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project>;

    /// DELETE `/api/projects/{id}`.
    async fn delete_project(&self, project_id: &str) -> ApiResult<()>;

    /// GET `/api/projects/{id}/photos`, or the folder-scoped variant when a
    /// folder id is given.
    async fn list_photos(
        &self,
        project_id: &str,
        folder_id: Option<&str>,
    ) -> ApiResult<PhotoListResponse>;

    /// POST `/api/photos/{id}/favorite`. The server may answer with the
    /// updated photo or with no content.
    async fn toggle_favorite(&self, photo_id: &str) -> ApiResult<Option<Photo>>;
}

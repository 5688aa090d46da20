//! Mock API implementation for testing
//!
//! A configurable in-memory stand-in for the REST API: fixture data, failure
//! injection, optional latency, and call recording. Used by the store tests
//! here and available to downstream consumers for their own tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::ApiError;
use crate::types::{CreateProjectRequest, PhotoListResponse, Photo, Project, ProjectListResponse};

use super::{ApiResult, ProofroomApi};

/// Mock implementation of [`ProofroomApi`].
///
/// Interior-mutable so tests can reconfigure failures mid-flight through a
/// shared `Arc<MockApi>`.
pub struct MockApi {
    projects: Mutex<Vec<Project>>,
    photos: Mutex<Vec<Photo>>,
    /// When set, every call fails with a clone of this error.
    fail_with: Mutex<Option<ApiError>>,
    /// Simulated network latency per call.
    delay: Mutex<Duration>,
    /// Method names in invocation order, for verification.
    calls: Mutex<Vec<String>>,
    /// Whether `toggle_favorite` answers with the updated photo (vs. 204).
    favorite_returns_body: Mutex<bool>,
}

impl MockApi {
    pub fn new() -> Self {
        Self {
            projects: Mutex::new(Vec::new()),
            photos: Mutex::new(Vec::new()),
            fail_with: Mutex::new(None),
            delay: Mutex::new(Duration::ZERO),
            calls: Mutex::new(Vec::new()),
            favorite_returns_body: Mutex::new(true),
        }
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        let mock = Self::new();
        *mock.projects.lock().unwrap() = projects;
        mock
    }

    pub fn with_photos(photos: Vec<Photo>) -> Self {
        let mock = Self::new();
        *mock.photos.lock().unwrap() = photos;
        mock
    }

    /// A mock where every call fails with the given error.
    pub fn failing(error: ApiError) -> Self {
        let mock = Self::new();
        mock.set_failure(Some(error));
        mock
    }

    /// Inject (or clear) a failure for subsequent calls.
    pub fn set_failure(&self, error: Option<ApiError>) {
        *self.fail_with.lock().unwrap() = error;
    }

    /// Delay every call by the given duration, for overlap tests.
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Make `toggle_favorite` answer with no body, like a 204 server.
    pub fn without_favorite_body(self) -> Self {
        *self.favorite_returns_body.lock().unwrap() = false;
        self
    }

    /// Replace the project fixtures.
    pub fn set_projects(&self, projects: Vec<Project>) {
        *self.projects.lock().unwrap() = projects;
    }

    /// Replace the photo fixtures.
    pub fn set_photos(&self, photos: Vec<Photo>) {
        *self.photos.lock().unwrap() = photos;
    }

    /// Method names recorded so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// How many times the named method was called.
    pub fn call_count(&self, method: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == method).count()
    }

    /// Mint a project the way the server would.
    pub fn mint_project(title: &str, client_id: Option<&str>) -> Project {
        let mut project = Project::new(uuid::Uuid::new_v4().to_string(), title);
        project.client_id = client_id.map(str::to_string);
        project
    }

    async fn begin(&self, method: &str) -> ApiResult<()> {
        self.calls.lock().unwrap().push(method.to_string());

        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            sleep(delay).await;
        }

        match self.fail_with.lock().unwrap().clone() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl Default for MockApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProofroomApi for MockApi {
    async fn list_projects(&self, client_id: Option<&str>) -> ApiResult<ProjectListResponse> {
        self.begin("list_projects").await?;

        let projects: Vec<Project> = self
            .projects
            .lock()
            .unwrap()
            .iter()
            .filter(|p| match client_id {
                Some(id) => p.client_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect();

        let total = projects.len() as u64;
        Ok(ProjectListResponse { projects, total })
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project> {
        self.begin("create_project").await?;

        let project = Self::mint_project(&request.title, request.client_id.as_deref());
        self.projects.lock().unwrap().push(project.clone());
        Ok(project)
    }

    async fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        self.begin("delete_project").await?;

        let mut projects = self.projects.lock().unwrap();
        let before = projects.len();
        projects.retain(|p| p.id != project_id);
        if projects.len() == before {
            return Err(ApiError::Status {
                code: 404,
                detail: Some(format!("Project {} not found", project_id)),
            });
        }
        Ok(())
    }

    async fn list_photos(
        &self,
        project_id: &str,
        folder_id: Option<&str>,
    ) -> ApiResult<PhotoListResponse> {
        self.begin("list_photos").await?;

        let photos: Vec<Photo> = self
            .photos
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.project_id == project_id)
            .filter(|p| match folder_id {
                Some(id) => p.folder_id.as_deref() == Some(id),
                None => true,
            })
            .cloned()
            .collect();

        Ok(PhotoListResponse { photos })
    }

    async fn toggle_favorite(&self, photo_id: &str) -> ApiResult<Option<Photo>> {
        self.begin("toggle_favorite").await?;

        let mut photos = self.photos.lock().unwrap();
        let photo = photos.iter_mut().find(|p| p.id == photo_id).ok_or_else(|| {
            ApiError::Status {
                code: 404,
                detail: Some(format!("Photo {} not found", photo_id)),
            }
        })?;
        photo.toggle_favorite();

        if *self.favorite_returns_body.lock().unwrap() {
            Ok(Some(photo.clone()))
        } else {
            Ok(None)
        }
    }
}

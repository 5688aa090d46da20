//! HTTP implementation of the API client

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::{ApiError, Result};
use crate::types::{CreateProjectRequest, PhotoListResponse, Photo, Project, ProjectListResponse};

use super::{ApiResult, ProofroomApi};

/// Error body shape the server uses for non-2xx responses.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

/// `reqwest`-backed client for the studio's REST API.
///
/// Carries the configured base URL, an optional bearer token, and the
/// client-level timeout. Idempotent reads retry transient (network-kind)
/// failures with exponential backoff; writes are issued exactly once.
pub struct HttpApi {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    retries: u32,
}

impl HttpApi {
    pub fn new(config: &ApiConfig, token: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ApiError::Other(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token,
            retries: config.retries,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Whether a failure is worth retrying on an idempotent read.
    ///
    /// Only connectivity-class failures qualify; an HTTP status answer means
    /// the server heard us.
    fn is_transient(error: &ApiError) -> bool {
        matches!(
            error,
            ApiError::Connect(_) | ApiError::Timeout(_) | ApiError::Aborted(_)
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ApiResult<T> {
        let max_attempts = self.retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let request = self.authorize(self.client.get(self.url(path)).query(query));

            match Self::decode_response(request.send().await).await {
                Ok(value) => return Ok(value),
                Err(e) if Self::is_transient(&e) && attempt < max_attempts => {
                    let delay_secs = 2_u64.pow(attempt - 1);
                    tracing::warn!(
                        "GET {} failed (attempt {}/{}): {}. Retrying in {}s",
                        path,
                        attempt,
                        max_attempts,
                        e,
                        delay_secs
                    );
                    tokio::time::sleep(Duration::from_secs(delay_secs)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn decode_response<T: DeserializeOwned>(
        response: reqwest::Result<reqwest::Response>,
    ) -> ApiResult<T> {
        let response = response.map_err(ApiError::from)?;
        let status = response.status();

        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Decode(e.to_string()))
        } else {
            Err(Self::status_error(status.as_u16(), response).await)
        }
    }

    /// Read a non-2xx response for a body `detail` before converting it.
    async fn status_error(code: u16, response: reqwest::Response) -> ApiError {
        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.detail);
        ApiError::Status { code, detail }
    }
}

#[async_trait]
impl ProofroomApi for HttpApi {
    async fn list_projects(&self, client_id: Option<&str>) -> ApiResult<ProjectListResponse> {
        let query: Vec<(&str, &str)> = match client_id {
            Some(id) => vec![("client_id", id)],
            None => vec![],
        };
        self.get_json("/api/projects/", &query).await
    }

    async fn create_project(&self, request: &CreateProjectRequest) -> ApiResult<Project> {
        tracing::debug!("Creating project {:?}", request.title);
        let response = self
            .authorize(self.client.post(self.url("/api/projects/")).json(request))
            .send()
            .await;
        Self::decode_response(response).await
    }

    async fn delete_project(&self, project_id: &str) -> ApiResult<()> {
        tracing::debug!("Deleting project {}", project_id);
        let path = format!("/api/projects/{}", project_id);
        let response = self
            .authorize(self.client.delete(self.url(&path)))
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::status_error(status.as_u16(), response).await)
        }
    }

    async fn list_photos(
        &self,
        project_id: &str,
        folder_id: Option<&str>,
    ) -> ApiResult<PhotoListResponse> {
        let path = match folder_id {
            Some(folder_id) => {
                format!("/api/projects/{}/folders/{}/photos", project_id, folder_id)
            }
            None => format!("/api/projects/{}/photos", project_id),
        };
        self.get_json(&path, &[]).await
    }

    async fn toggle_favorite(&self, photo_id: &str) -> ApiResult<Option<Photo>> {
        tracing::debug!("Toggling favorite on photo {}", photo_id);
        let path = format!("/api/photos/{}/favorite", photo_id);
        let response = self
            .authorize(self.client.post(self.url(&path)))
            .send()
            .await
            .map_err(ApiError::from)?;

        let status = response.status();
        if !status.is_success() {
            return Err(Self::status_error(status.as_u16(), response).await);
        }

        // 204 or an empty body both mean "toggled, nothing to reconcile".
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice::<Photo>(&bytes)
            .map(Some)
            .map_err(|e| ApiError::Decode(e.to_string()))
    }
}

//! Core domain types for Proofroom

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A photo inside a client gallery.
///
/// Belongs to exactly one project and at most one folder within it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: String,
    pub project_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<String>,
    #[serde(default)]
    pub is_favorite: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at: Option<DateTime<Utc>>,
}

impl Photo {
    pub fn new(id: impl Into<String>, project_id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            project_id: project_id.into(),
            folder_id: None,
            is_favorite: false,
            file_name: None,
            captured_at: None,
        }
    }

    pub fn in_folder(mut self, folder_id: impl Into<String>) -> Self {
        self.folder_id = Some(folder_id.into());
        self
    }

    /// Invert the favorite flag in place.
    pub fn toggle_favorite(&mut self) {
        self.is_favorite = !self.is_favorite;
    }
}

/// Lifecycle status of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProjectStatus {
    Active,
    #[default]
    Draft,
    Archived,
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProjectStatus::Active => write!(f, "active"),
            ProjectStatus::Draft => write!(f, "draft"),
            ProjectStatus::Archived => write!(f, "archived"),
        }
    }
}

/// A shoot delivered to a client, holding an ordered set of photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
    #[serde(default)]
    pub photo_count: u32,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub has_folders: bool,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Project {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            client_id: None,
            photo_count: 0,
            is_locked: false,
            has_folders: false,
            status: ProjectStatus::Draft,
            created_at: Some(Utc::now()),
        }
    }

    pub fn with_client(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }
}

/// Response envelope for GET `/api/projects/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectListResponse {
    pub projects: Vec<Project>,
    pub total: u64,
}

/// Response envelope for the photo listing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoListResponse {
    pub photos: Vec<Photo>,
}

/// Request body for POST `/api/projects/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProjectRequest {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<String>,
}

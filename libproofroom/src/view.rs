//! View-state derivation
//!
//! Pure mapping from store snapshots to the states a screen renders and to
//! card view-models. Nothing here draws anything; the layer exists so UI
//! code holds no branching logic of its own.

use serde::{Deserialize, Serialize};

use crate::store::StoreSnapshot;
use crate::types::{Photo, Project};

/// The state a collection screen is in.
///
/// Precedence: loading over error over empty over content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ViewState<T> {
    Loading,
    Empty,
    Failed { message: String },
    Content { items: Vec<T> },
}

impl<T: Clone> ViewState<T> {
    /// Derive the view state from a store snapshot.
    pub fn from_snapshot(snapshot: &StoreSnapshot<T>) -> Self {
        if snapshot.is_loading {
            ViewState::Loading
        } else if let Some(message) = &snapshot.error {
            ViewState::Failed {
                message: message.clone(),
            }
        } else if snapshot.items.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Content {
                items: snapshot.items.clone(),
            }
        }
    }
}

/// Card view-model for a project list entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectCard {
    pub title: String,
    pub status_label: String,
    pub caption: String,
    pub locked: bool,
}

impl ProjectCard {
    pub fn from_project(project: &Project) -> Self {
        Self {
            title: project.title.clone(),
            status_label: project.status.to_string(),
            caption: format_photo_count(project.photo_count),
            locked: project.is_locked,
        }
    }
}

/// Card view-model for a photo grid entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoCard {
    pub label: String,
    pub is_favorite: bool,
    pub folder_badge: Option<String>,
}

impl PhotoCard {
    pub fn from_photo(photo: &Photo) -> Self {
        Self {
            label: photo.file_name.clone().unwrap_or_else(|| photo.id.clone()),
            is_favorite: photo.is_favorite,
            folder_badge: photo.folder_id.clone(),
        }
    }
}

/// "No photos", "1 photo", "12 photos".
pub fn format_photo_count(count: u32) -> String {
    match count {
        0 => "No photos".to_string(),
        1 => "1 photo".to_string(),
        n => format!("{} photos", n),
    }
}

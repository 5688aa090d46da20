//! Proofroom - client-proofing gallery data layer
//!
//! This library wraps a photography studio's REST API with typed domain
//! entities, a total error classifier, collection stores with loading/error
//! state, and a cross-backend storage adapter for the auth token.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod service;
pub mod session;
pub mod storage;
pub mod store;
pub mod types;
pub mod view;

// Re-export commonly used types
pub use config::Config;
pub use error::{ErrorInfo, ErrorKind, ProofroomError, Result};
pub use service::ProofroomService;
pub use store::{MutationOutcome, PhotosStore, ProjectsStore, StoreSnapshot};
pub use types::{Photo, Project, ProjectStatus};

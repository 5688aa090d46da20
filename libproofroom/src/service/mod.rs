//! Service layer for Proofroom
//!
//! `ProofroomService` is the explicit dependency-injection root of the data
//! layer: it owns the shared API client, the storage adapter, and the event
//! bus, and hands out collection stores to consumers. Nothing in the library
//! lives in process-wide mutable state; a consumer that wants two isolated
//! data layers constructs two services.
//!
//! # Example
//!
//! ```no_run
//! use libproofroom::service::ProofroomService;
//!
//! # async fn example() -> libproofroom::Result<()> {
//! let service = ProofroomService::new()?;
//!
//! let projects = service.projects(None, true).await;
//! for project in projects.snapshot().await.items {
//!     println!("{}: {}", project.id, project.title);
//! }
//! # Ok(())
//! # }
//! ```

pub mod events;

pub use events::{EventBus, EventReceiver, StoreEvent};

use std::sync::Arc;

use crate::api::{HttpApi, ProofroomApi};
use crate::config::Config;
use crate::error::Result;
use crate::session::Session;
use crate::storage::StorageAdapter;
use crate::store::photos::PhotoScope;
use crate::store::{PhotosStore, ProjectsStore, Refresher};

pub struct ProofroomService {
    api: Arc<dyn ProofroomApi>,
    storage: Arc<StorageAdapter>,
    session: Session,
    event_bus: EventBus,
}

impl ProofroomService {
    /// Create a service from the default configuration location.
    ///
    /// The stored auth token, if any, is attached to the HTTP client.
    pub fn new() -> Result<Self> {
        Self::from_config(Config::load()?)
    }

    /// Create a service from a pre-built configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let storage = Arc::new(StorageAdapter::new(&config.storage)?);
        let session = Session::new(Arc::clone(&storage));
        let api = Arc::new(HttpApi::new(&config.api, session.token())?);

        Ok(Self {
            api,
            storage,
            session,
            event_bus: EventBus::new(100),
        })
    }

    /// Wire a service over explicit parts. This is the seam tests and
    /// embedders use to substitute the API client or storage backend.
    pub fn with_parts(api: Arc<dyn ProofroomApi>, storage: Arc<StorageAdapter>) -> Self {
        let session = Session::new(Arc::clone(&storage));
        Self {
            api,
            storage,
            session,
            event_bus: EventBus::new(100),
        }
    }

    /// Hand out a projects store, optionally scoped to one client.
    ///
    /// With `fetch_on_init` the store performs its initial fetch before it
    /// is returned.
    pub async fn projects(&self, client_id: Option<String>, fetch_on_init: bool) -> ProjectsStore {
        let store = ProjectsStore::new(Arc::clone(&self.api), self.event_bus.clone(), client_id);
        if fetch_on_init {
            store.refetch().await;
        }
        store
    }

    /// Hand out a photos store for one project, optionally narrowed to a
    /// folder.
    pub async fn photos(&self, scope: PhotoScope, fetch_on_init: bool) -> PhotosStore {
        let store = PhotosStore::new(Arc::clone(&self.api), self.event_bus.clone(), scope);
        if fetch_on_init {
            store.refetch().await;
        }
        store
    }

    /// A fresh refresh coordinator. Register the stores to sweep on it.
    pub fn refresher(&self) -> Refresher {
        Refresher::new()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn storage(&self) -> &StorageAdapter {
        &self.storage
    }

    /// Subscribe to store events emitted through this service's stores.
    pub fn subscribe(&self) -> EventReceiver {
        self.event_bus.subscribe()
    }
}

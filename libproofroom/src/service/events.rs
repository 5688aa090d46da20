//! Store event distribution
//!
//! An in-process broadcast bus the collection stores emit over. Emission is
//! non-blocking and never fails the emitting operation: with no subscribers
//! the event is dropped, and a lagging subscriber misses old events rather
//! than slowing the store down.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::error::ErrorInfo;

/// Event receiver type alias
pub type EventReceiver = broadcast::Receiver<StoreEvent>;

#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    /// Create a bus with the given per-subscriber buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> EventReceiver {
        self.sender.subscribe()
    }

    /// Emit to all subscribers. A send error just means nobody is listening.
    pub fn emit(&self, event: StoreEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

/// Events emitted by the collection stores
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreEvent {
    /// A projects store replaced its collection from the server.
    ProjectsRefreshed { count: usize },

    /// A photos store replaced its collection from the server.
    PhotosRefreshed { project_id: String, count: usize },

    /// A refetch settled with a failure; the previous collection stands.
    RefreshFailed { source: String, error: ErrorInfo },

    /// A project was created and prepended to the collection.
    ProjectCreated { project_id: String, title: String },

    /// A project was deleted and filtered out of the collection.
    ProjectDeleted { project_id: String },

    /// A photo's favorite flag was toggled in place.
    FavoriteToggled { photo_id: String, is_favorite: bool },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[tokio::test]
    async fn test_emission_and_subscription() {
        let bus = EventBus::new(10);
        let mut receiver = bus.subscribe();

        bus.emit(StoreEvent::ProjectsRefreshed { count: 3 });

        match receiver.recv().await.unwrap() {
            StoreEvent::ProjectsRefreshed { count } => assert_eq!(count, 3),
            other => panic!("Wrong event: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_multiple_subscribers_see_the_event() {
        let bus = EventBus::new(10);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();

        bus.emit(StoreEvent::ProjectDeleted {
            project_id: "proj-1".to_string(),
        });

        assert!(matches!(
            first.recv().await.unwrap(),
            StoreEvent::ProjectDeleted { .. }
        ));
        assert!(matches!(
            second.recv().await.unwrap(),
            StoreEvent::ProjectDeleted { .. }
        ));
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_does_not_block() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);
        bus.emit(StoreEvent::FavoriteToggled {
            photo_id: "ph-1".to_string(),
            is_favorite: true,
        });
    }

    #[tokio::test]
    async fn test_event_serialization() {
        let event = StoreEvent::RefreshFailed {
            source: "projects".to_string(),
            error: ErrorInfo {
                kind: ErrorKind::Server,
                message: "The server ran into a problem.".to_string(),
                code: Some(503),
            },
        };

        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("refresh_failed"));
        assert!(json.contains("503"));

        let decoded: StoreEvent = serde_json::from_str(&json).unwrap();
        match decoded {
            StoreEvent::RefreshFailed { source, error } => {
                assert_eq!(source, "projects");
                assert_eq!(error.kind, ErrorKind::Server);
            }
            other => panic!("Wrong event: {:?}", other),
        }
    }
}

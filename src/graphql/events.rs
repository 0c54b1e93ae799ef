//! In-process event bus feeding the Subscription resolvers
//!
//! Mutations publish domain events here; subscription resolvers bridge the
//! broadcast channel to the WebSocket transport. Delivery is best-effort and
//! at-most-once per subscriber: there is no durability, and a subscriber
//! connected after an event was published never sees it.
//!
//! The bus is injected through schema data rather than living in a module
//! global, so tests can hand a bus to the schema and assert on emissions.

use tokio::sync::broadcast;

use super::types::{Author, Book};

/// Default broadcast channel capacity
const DEFAULT_CAPACITY: usize = 64;

/// Domain events published by the mutation resolvers
#[derive(Debug, Clone)]
pub enum CatalogEvent {
    BookAdded(Book),
    AuthorAdded(Author),
    AuthorUpdated(Author),
}

/// Broadcast-backed publish/subscribe bus
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CatalogEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(DEFAULT_CAPACITY);
        Self { sender }
    }

    /// Publish an event to all current subscribers. A send with no
    /// subscribers is not an error.
    pub fn publish(&self, event: CatalogEvent) {
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<CatalogEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

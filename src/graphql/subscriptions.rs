//! GraphQL subscription resolvers
//!
//! Each resolver snapshots a receiver from the shared event bus at the
//! moment the subscription starts and filters the broadcast down to its own
//! event kind. Lagged receivers drop the missed events silently; delivery
//! is best-effort by design of the bus.

use async_graphql::{Context, Subscription};
use futures::Stream;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use super::events::{CatalogEvent, EventBus};
use super::types::{Author, Book};

pub struct SubscriptionRoot;

#[Subscription]
impl SubscriptionRoot {
    /// Fires once per successful addBook
    async fn book_added(&self, ctx: &Context<'_>) -> impl Stream<Item = Book> {
        let bus = ctx.data_unchecked::<EventBus>();
        BroadcastStream::new(bus.subscribe()).filter_map(|event| match event {
            Ok(CatalogEvent::BookAdded(book)) => Some(book),
            _ => None,
        })
    }

    /// Fires once per successful addAuthor
    async fn author_added(&self, ctx: &Context<'_>) -> impl Stream<Item = Author> {
        let bus = ctx.data_unchecked::<EventBus>();
        BroadcastStream::new(bus.subscribe()).filter_map(|event| match event {
            Ok(CatalogEvent::AuthorAdded(author)) => Some(author),
            _ => None,
        })
    }

    /// Fires when an author changes: editAuthor, and the counter bump that
    /// addBook performs on its author
    async fn author_updated(&self, ctx: &Context<'_>) -> impl Stream<Item = Author> {
        let bus = ctx.data_unchecked::<EventBus>();
        BroadcastStream::new(bus.subscribe()).filter_map(|event| match event {
            Ok(CatalogEvent::AuthorUpdated(author)) => Some(author),
            _ => None,
        })
    }
}

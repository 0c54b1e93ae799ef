//! GraphQL type definitions
//!
//! View objects mirroring the store records, decorated with async-graphql
//! attributes. A Book's author is a tagged reference: freshly created books
//! carry the full author they were built with, store-loaded books carry the
//! reference id and resolve it lazily in the `author` field resolver.

use async_graphql::{ComplexObject, Context, ErrorExtensions, Result, SimpleObject};

use crate::db::{AuthorRecord, BookRecord, Database, UserRecord};
use crate::errors::CatalogError;

#[derive(Debug, Clone, SimpleObject)]
pub struct Author {
    pub id: String,
    pub name: String,
    pub born: Option<i64>,
    pub description: Option<String>,
    pub image_id: Option<String>,
    pub book_count: i64,
}

impl From<AuthorRecord> for Author {
    fn from(r: AuthorRecord) -> Self {
        Self {
            id: r.id,
            name: r.name,
            born: r.born,
            description: r.description,
            image_id: r.image_id,
            book_count: r.book_count,
        }
    }
}

/// How a Book refers to its author. Explicit instead of structural: the
/// caller constructing the Book decides which shape it hands over, and the
/// field resolver matches on the tag rather than probing for a name.
#[derive(Debug, Clone)]
pub enum AuthorRef {
    /// Author already resolved (fresh from addBook)
    Loaded(Author),
    /// Bare reference id needing a lookup (loaded from the store)
    Id(String),
}

#[derive(Debug, Clone, SimpleObject)]
#[graphql(complex)]
pub struct Book {
    pub id: String,
    pub title: String,
    pub published: i64,
    pub genres: Vec<String>,
    pub image_id: Option<String>,
    pub description: Option<String>,
    #[graphql(skip)]
    pub author_ref: AuthorRef,
}

impl Book {
    /// View of a store-loaded record; the author stays a reference id
    pub fn from_record(r: BookRecord) -> Self {
        Self {
            id: r.id,
            title: r.title,
            published: r.published,
            genres: r.genres,
            image_id: r.image_id,
            description: r.description,
            author_ref: AuthorRef::Id(r.author_id),
        }
    }

    /// View of a freshly created record with the author embedded
    pub fn from_record_with_author(r: BookRecord, author: Author) -> Self {
        Self {
            author_ref: AuthorRef::Loaded(author),
            ..Self::from_record(r)
        }
    }
}

#[ComplexObject]
impl Book {
    /// Resolve the book's author: an embedded author is returned as-is, a
    /// reference id is looked up with the stored counter.
    async fn author(&self, ctx: &Context<'_>) -> Result<Author> {
        match &self.author_ref {
            AuthorRef::Loaded(author) => Ok(author.clone()),
            AuthorRef::Id(id) => {
                let db = ctx.data_unchecked::<Database>();
                let record = db
                    .authors()
                    .get_by_id(id)
                    .await
                    .map_err(|e| CatalogError::internal(e).extend())?
                    .ok_or_else(|| CatalogError::AuthorNotFound(id.clone()).extend())?;
                Ok(record.into())
            }
        }
    }
}

#[derive(Debug, Clone, SimpleObject)]
pub struct User {
    pub id: String,
    pub username: String,
    pub favorite_genre: Option<String>,
}

impl From<UserRecord> for User {
    fn from(r: UserRecord) -> Self {
        Self {
            id: r.id,
            username: r.username,
            favorite_genre: r.favorite_genre,
        }
    }
}

/// Transient login result; never persisted
#[derive(Debug, Clone, SimpleObject)]
pub struct Token {
    pub value: String,
}

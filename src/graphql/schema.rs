//! GraphQL schema definition with queries and mutations
//!
//! This is the single API surface for the catalog. Mutations follow the same
//! sequence throughout: authenticate, validate, touch the store, publish
//! events, return the view object. Authentication and validation failures
//! propagate with their own codes; everything unclassified from the store
//! surfaces as INTERNAL_SERVER_ERROR.

use std::io::Read;
use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, Object, Result, Schema, Upload};

use crate::config::Config;
use crate::db::{CreateBook, CreateUser, Database};
use crate::errors::CatalogError;

use super::auth::{AuthExt, issue_token};
use super::events::{CatalogEvent, EventBus};
use super::subscriptions::SubscriptionRoot;
use super::types::{Author, Book, Token, User};
use super::validate;

/// Bcrypt cost factor for password hashing
const BCRYPT_COST: u32 = 10;

/// The GraphQL schema type
pub type CatalogSchema = Schema<QueryRoot, MutationRoot, SubscriptionRoot>;

/// Build the GraphQL schema with all resolvers and their collaborators
pub fn build_schema(db: Database, bus: EventBus, config: Arc<Config>) -> CatalogSchema {
    Schema::build(QueryRoot, MutationRoot, SubscriptionRoot)
        .data(db)
        .data(bus)
        .data(config)
        .finish()
}

fn internal(err: anyhow::Error) -> async_graphql::Error {
    CatalogError::internal(err).extend()
}

// ============================================================================
// Query Root
// ============================================================================

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Number of books in the catalog
    async fn book_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        db.books().count().await.map_err(internal)
    }

    /// Number of authors in the catalog
    async fn author_count(&self, ctx: &Context<'_>) -> Result<i64> {
        let db = ctx.data_unchecked::<Database>();
        db.authors().count().await.map_err(internal)
    }

    /// Books, optionally filtered by author name and/or genre membership.
    /// An unknown author yields an empty list, not an error.
    async fn all_books(
        &self,
        ctx: &Context<'_>,
        author: Option<String>,
        genre: Option<String>,
    ) -> Result<Vec<Book>> {
        let db = ctx.data_unchecked::<Database>();
        let books = db.books();

        let records = match (author, genre) {
            (Some(author), Some(genre)) => {
                match db.authors().get_by_name(&author).await.map_err(internal)? {
                    Some(a) => books
                        .list_by_author_and_genre(&a.id, &genre)
                        .await
                        .map_err(internal)?,
                    None => Vec::new(),
                }
            }
            (Some(author), None) => {
                match db.authors().get_by_name(&author).await.map_err(internal)? {
                    Some(a) => books.list_by_author(&a.id).await.map_err(internal)?,
                    None => Vec::new(),
                }
            }
            (None, Some(genre)) => books.list_by_genre(&genre).await.map_err(internal)?,
            (None, None) => books.list_all().await.map_err(internal)?,
        };

        Ok(records.into_iter().map(Book::from_record).collect())
    }

    /// All authors with bookCount computed live against the books relation
    async fn all_authors(&self, ctx: &Context<'_>) -> Result<Vec<Author>> {
        let db = ctx.data_unchecked::<Database>();
        let records = db.authors().list_with_live_count().await.map_err(internal)?;
        Ok(records.into_iter().map(Into::into).collect())
    }

    /// Distinct genre strings across all books, in store order
    async fn all_genres(&self, ctx: &Context<'_>) -> Result<Vec<String>> {
        let db = ctx.data_unchecked::<Database>();
        db.books().distinct_genres().await.map_err(internal)
    }

    /// The current authenticated user
    async fn me(&self, ctx: &Context<'_>) -> Result<User> {
        let user = ctx.current_user()?;
        Ok(User {
            id: user.id.clone(),
            username: user.username.clone(),
            favorite_genre: user.favorite_genre.clone(),
        })
    }
}

// ============================================================================
// Mutation Root
// ============================================================================

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Add a book, creating its author on the fly when unknown. The author's
    /// stored book counter is bumped by the resolution step; that bump is not
    /// rolled back if the book insert itself fails on a duplicate title.
    async fn add_book(
        &self,
        ctx: &Context<'_>,
        title: String,
        author: String,
        published: i32,
        genres: Vec<String>,
        description: Option<String>,
    ) -> Result<Book> {
        ctx.current_user()?;
        validate::validate_add_book(
            &author,
            &title,
            &genres,
            published as i64,
            description.as_deref(),
        )
        .map_err(|e| e.extend())?;

        let db = ctx.data_unchecked::<Database>();
        let author_record = db
            .authors()
            .find_or_increment(&author)
            .await
            .map_err(internal)?;
        let author_view = Author::from(author_record);

        let record = db
            .books()
            .insert(CreateBook {
                title,
                published: published as i64,
                author_id: author_view.id.clone(),
                genres,
                description,
            })
            .await
            .map_err(internal)?;

        let book = Book::from_record_with_author(record, author_view.clone());

        let bus = ctx.data_unchecked::<EventBus>();
        bus.publish(CatalogEvent::AuthorUpdated(author_view));
        bus.publish(CatalogEvent::BookAdded(book.clone()));

        Ok(book)
    }

    /// Create an author explicitly
    async fn add_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        born: Option<i32>,
        description: Option<String>,
    ) -> Result<Author> {
        ctx.current_user()?;
        validate::validate_add_author(&name, born.map(i64::from), description.as_deref())
            .map_err(|e| e.extend())?;

        let db = ctx.data_unchecked::<Database>();
        let record = db
            .authors()
            .insert(&name, born.map(i64::from), description.as_deref())
            .await
            .map_err(internal)?;
        let author = Author::from(record);

        let bus = ctx.data_unchecked::<EventBus>();
        bus.publish(CatalogEvent::AuthorAdded(author.clone()));

        Ok(author)
    }

    /// Update an author's birth year
    async fn edit_author(
        &self,
        ctx: &Context<'_>,
        name: String,
        set_born_to: Option<i32>,
    ) -> Result<Author> {
        ctx.current_user()?;
        let born = validate::validate_edit_author(set_born_to.map(i64::from))
            .map_err(|e| e.extend())?;

        let db = ctx.data_unchecked::<Database>();
        let record = db
            .authors()
            .set_born(&name, born)
            .await
            .map_err(internal)?
            .ok_or_else(|| CatalogError::AuthorNotFound(name).extend())?;
        let author = Author::from(record);

        let bus = ctx.data_unchecked::<EventBus>();
        bus.publish(CatalogEvent::AuthorUpdated(author.clone()));

        Ok(author)
    }

    /// Register a new user. Open to anonymous callers.
    async fn create_user(
        &self,
        ctx: &Context<'_>,
        username: String,
        password: String,
        favorite_genre: Option<String>,
    ) -> Result<User> {
        validate::validate_create_user(&username, favorite_genre.as_deref())
            .map_err(|e| e.extend())?;

        let password_hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
            .await
            .map_err(|e| internal(e.into()))?
            .map_err(|e| internal(e.into()))?;

        let db = ctx.data_unchecked::<Database>();
        let record = db
            .users()
            .insert(CreateUser {
                username,
                favorite_genre,
                password_hash,
            })
            .await
            .map_err(internal)?;

        Ok(record.into())
    }

    /// Exchange credentials for a signed token. An unknown username and a
    /// wrong password are deliberately indistinguishable to the caller.
    async fn login(&self, ctx: &Context<'_>, username: String, password: String) -> Result<Token> {
        let config = ctx.data_unchecked::<Arc<Config>>();
        let secret = config
            .jwt_secret
            .as_deref()
            .ok_or_else(|| CatalogError::MissingJwtSecret.extend())?;

        let db = ctx.data_unchecked::<Database>();
        let user = db
            .users()
            .get_by_username(&username)
            .await
            .map_err(internal)?
            .ok_or_else(|| CatalogError::WrongCredentials.extend())?;

        let hash = user.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| internal(e.into()))?
            .map_err(|e| internal(e.into()))?;
        if !matches {
            return Err(CatalogError::WrongCredentials.extend());
        }

        let value = issue_token(secret, &user.username, &user.id)
            .map_err(|e| internal(e.into()))?;
        Ok(Token { value })
    }

    /// Attach an uploaded cover image to a book
    async fn upload_book_image(&self, ctx: &Context<'_>, book_id: String, file: Upload) -> Result<Book> {
        ctx.current_user()?;
        let image_id = store_image(ctx, file).await?;

        let db = ctx.data_unchecked::<Database>();
        let record = db
            .books()
            .set_image(&book_id, &image_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CatalogError::BookNotFound.extend())?;

        Ok(Book::from_record(record))
    }

    /// Attach an uploaded portrait image to an author
    async fn upload_author_image(
        &self,
        ctx: &Context<'_>,
        author_id: String,
        file: Upload,
    ) -> Result<Author> {
        ctx.current_user()?;
        let image_id = store_image(ctx, file).await?;

        let db = ctx.data_unchecked::<Database>();
        let record = db
            .authors()
            .set_image(&author_id, &image_id)
            .await
            .map_err(internal)?
            .ok_or_else(|| CatalogError::AuthorNotFound(author_id).extend())?;

        Ok(Author::from(record))
    }

    /// Wipe every collection. Test tooling only; refused in production.
    async fn clear_collections(&self, ctx: &Context<'_>) -> Result<bool> {
        let config = ctx.data_unchecked::<Arc<Config>>();
        if config.is_production() {
            return Err(CatalogError::NotAllowedInProduction.extend());
        }

        let db = ctx.data_unchecked::<Database>();
        db.clear_all_collections().await.map_err(internal)?;
        Ok(true)
    }
}

/// Validate, drain and persist an uploaded image, returning the blob id.
/// The declared MIME type is checked before the bytes are read; when the
/// client sent none, the type is sniffed from the content instead. Stream
/// failures surface as internal errors, not as bad input.
async fn store_image(ctx: &Context<'_>, file: Upload) -> Result<String> {
    let upload = file.value(ctx).map_err(|e| {
        CatalogError::Internal(anyhow::anyhow!("reading upload failed: {e}")).extend()
    })?;

    if let Some(declared) = upload.content_type.clone() {
        validate::validate_image_content_type(&declared).map_err(|e| e.extend())?;
    }

    let filename = upload.filename.clone();
    let declared_type = upload.content_type.clone();

    let data = tokio::task::spawn_blocking(move || {
        let mut bytes = Vec::new();
        upload.into_read().read_to_end(&mut bytes)?;
        Ok::<_, std::io::Error>(bytes)
    })
    .await
    .map_err(|e| internal(e.into()))?
    .map_err(|e| internal(e.into()))?;

    let content_type = match declared_type {
        Some(t) => t,
        None => {
            let sniffed = infer::get(&data)
                .map(|kind| kind.mime_type().to_string())
                .unwrap_or_default();
            validate::validate_image_content_type(&sniffed).map_err(|e| e.extend())?;
            sniffed
        }
    };

    let db = ctx.data_unchecked::<Database>();
    let image = db
        .images()
        .insert(&filename, &content_type, data)
        .await
        .map_err(internal)?;

    Ok(image.id)
}

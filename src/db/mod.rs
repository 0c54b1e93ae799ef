//! Database connection and repositories
//!
//! One repository per collection, all backed by a shared SQLite pool. The
//! repositories classify uniqueness violations into the catalog error
//! taxonomy; everything else propagates as-is for the resolver layer to wrap.

pub mod authors;
pub mod books;
pub mod images;
pub mod schema_sync;
pub mod sqlite_helpers;
pub mod users;

use anyhow::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

pub use authors::{AuthorRecord, AuthorsRepository};
pub use books::{BookRecord, BooksRepository, CreateBook};
pub use images::{ImageRecord, ImagesRepository};
pub use users::{CreateUser, UserRecord, UsersRepository};

/// Database wrapper providing connection pool access
#[derive(Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database wrapper from an existing pool
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get the maximum connection pool size from environment or default
    fn get_max_connections() -> u32 {
        std::env::var("DATABASE_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(10)
    }

    /// Create a new database connection pool and sync the schema
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(Self::get_max_connections())
            .connect(url)
            .await?;

        schema_sync::sync_schema(&pool).await?;

        Ok(Self { pool })
    }

    /// Get the underlying connection pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn authors(&self) -> AuthorsRepository {
        AuthorsRepository::new(self.pool.clone())
    }

    pub fn books(&self) -> BooksRepository {
        BooksRepository::new(self.pool.clone())
    }

    pub fn users(&self) -> UsersRepository {
        UsersRepository::new(self.pool.clone())
    }

    pub fn images(&self) -> ImagesRepository {
        ImagesRepository::new(self.pool.clone())
    }

    /// Delete every row from every collection. Only reachable through the
    /// clearCollections mutation, which is refused in production.
    pub async fn clear_all_collections(&self) -> Result<()> {
        sqlx::query("DELETE FROM books").execute(&self.pool).await?;
        sqlx::query("DELETE FROM authors").execute(&self.pool).await?;
        sqlx::query("DELETE FROM users").execute(&self.pool).await?;
        sqlx::query("DELETE FROM images").execute(&self.pool).await?;
        Ok(())
    }
}

/// True when the error is a store-level unique constraint violation
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map(|e| e.is_unique_violation())
        .unwrap_or(false)
}

#[cfg(test)]
pub(crate) async fn test_database() -> Database {
    Database::connect("sqlite::memory:")
        .await
        .expect("in-memory database")
}

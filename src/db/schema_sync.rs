//! Schema synchronization for the catalog tables
//!
//! Creates missing tables on startup. Uniqueness of author names, book titles
//! and usernames is enforced at the store level so concurrent inserts surface
//! as constraint violations rather than silent duplicates. Does not handle
//! column renames or type changes.

use sqlx::SqlitePool;
use tracing::{debug, info};

/// CREATE TABLE statements for every collection, leaves first.
const TABLES: &[(&str, &str)] = &[
    (
        "images",
        r#"
        CREATE TABLE images (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            content_type TEXT NOT NULL,
            data BLOB NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    ),
    (
        "authors",
        r#"
        CREATE TABLE authors (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            born INTEGER,
            description TEXT,
            image_id TEXT REFERENCES images(id),
            book_count INTEGER NOT NULL DEFAULT 0
        )
        "#,
    ),
    (
        "books",
        r#"
        CREATE TABLE books (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL UNIQUE,
            published INTEGER NOT NULL,
            author_id TEXT NOT NULL REFERENCES authors(id),
            genres TEXT NOT NULL,
            image_id TEXT REFERENCES images(id),
            description TEXT
        )
        "#,
    ),
    (
        "users",
        r#"
        CREATE TABLE users (
            id TEXT PRIMARY KEY,
            username TEXT NOT NULL UNIQUE,
            favorite_genre TEXT,
            password_hash TEXT NOT NULL
        )
        "#,
    ),
];

/// Check if a table exists in the database
async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool, sqlx::Error> {
    let result: Option<(String,)> =
        sqlx::query_as("SELECT name FROM sqlite_master WHERE type='table' AND name = ?")
            .bind(table_name)
            .fetch_optional(pool)
            .await?;

    Ok(result.is_some())
}

/// Create any missing catalog tables
pub async fn sync_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    for (name, create_sql) in TABLES {
        if table_exists(pool, name).await? {
            debug!("Table {} already exists", name);
            continue;
        }
        sqlx::query(create_sql).execute(pool).await?;
        info!("Created table: {}", name);
    }
    Ok(())
}

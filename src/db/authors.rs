//! Authors repository
//!
//! Owns the derived `book_count` column. The stored counter is written only
//! by [`AuthorsRepository::find_or_increment`]; the listing path computes a
//! live relation count instead and ignores the stored value.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::CatalogError;

use super::is_unique_violation;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AuthorRecord {
    pub id: String,
    pub name: String,
    pub born: Option<i64>,
    pub description: Option<String>,
    pub image_id: Option<String>,
    pub book_count: i64,
}

pub struct AuthorsRepository {
    pool: SqlitePool,
}

impl AuthorsRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new author. A unique-constraint violation on the name is
    /// classified as `DUPLICATE_AUTHOR_NAME`.
    pub async fn insert(
        &self,
        name: &str,
        born: Option<i64>,
        description: Option<&str>,
    ) -> Result<AuthorRecord> {
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO authors (id, name, born, description, book_count) VALUES (?, ?, ?, ?, 0)",
        )
        .bind(&id)
        .bind(name)
        .bind(born)
        .bind(description)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(CatalogError::DuplicateAuthorName(name.to_string()).into());
            }
            Err(e) => return Err(e.into()),
        }

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("author vanished after insert"))
    }

    /// Find an author by name, creating it if absent, and bump the stored
    /// book counter by exactly one. Called once per successful addBook.
    ///
    /// The increment commits independently of any book insert the caller
    /// performs afterwards: if that insert fails (duplicate title), the
    /// counter stays bumped. Concurrent calls for the same name can also race
    /// on the read-modify-write and lose an update. Both windows are accepted
    /// behavior; the live count in [`Self::list_with_live_count`] is the
    /// reconciliation point.
    pub async fn find_or_increment(&self, name: &str) -> Result<AuthorRecord> {
        if self.get_by_name(name).await?.is_none() {
            let id = Uuid::new_v4().to_string();
            let result = sqlx::query("INSERT INTO authors (id, name, book_count) VALUES (?, ?, 0)")
                .bind(&id)
                .bind(name)
                .execute(&self.pool)
                .await;
            match result {
                Ok(_) => {}
                // Lost the creation race to a concurrent caller; the row
                // exists now, which is all we need.
                Err(e) if is_unique_violation(&e) => {}
                Err(e) => return Err(e.into()),
            }
        }

        sqlx::query("UPDATE authors SET book_count = book_count + 1 WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        self.get_by_name(name)
            .await?
            .ok_or_else(|| anyhow::anyhow!("author vanished after increment"))
    }

    /// Look up an author by name with the stored counter
    pub async fn get_by_name(&self, name: &str) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(
            "SELECT id, name, born, description, image_id, book_count FROM authors WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Look up an author by id with the stored counter
    pub async fn get_by_id(&self, id: &str) -> Result<Option<AuthorRecord>> {
        let record = sqlx::query_as::<_, AuthorRecord>(
            "SELECT id, name, born, description, image_id, book_count FROM authors WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    /// Update an author's birth year by name. Returns the updated record with
    /// the stored counter, or None when no author has that name.
    pub async fn set_born(&self, name: &str, born: i64) -> Result<Option<AuthorRecord>> {
        let result = sqlx::query("UPDATE authors SET born = ? WHERE name = ?")
            .bind(born)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_name(name).await
    }

    /// Attach an uploaded image to an author
    pub async fn set_image(&self, id: &str, image_id: &str) -> Result<Option<AuthorRecord>> {
        let result = sqlx::query("UPDATE authors SET image_id = ? WHERE id = ?")
            .bind(image_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    /// All authors with `book_count` computed live against the books
    /// relation, independent of the stored counter.
    pub async fn list_with_live_count(&self) -> Result<Vec<AuthorRecord>> {
        let records = sqlx::query_as::<_, AuthorRecord>(
            "SELECT a.id, a.name, a.born, a.description, a.image_id, \
             (SELECT COUNT(*) FROM books b WHERE b.author_id = a.id) AS book_count \
             FROM authors a",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM authors")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

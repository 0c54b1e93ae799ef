//! Books repository
//!
//! Genres are stored as a JSON text column; filtering uses SQLite's
//! `json_each` so membership checks happen in the store rather than in Rust.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::CatalogError;

use super::is_unique_violation;
use super::sqlite_helpers::{json_array_contains_sql, json_to_vec, vec_to_json};

#[derive(Debug, Clone)]
pub struct BookRecord {
    pub id: String,
    pub title: String,
    pub published: i64,
    pub author_id: String,
    pub genres: Vec<String>,
    pub image_id: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CreateBook {
    pub title: String,
    pub published: i64,
    pub author_id: String,
    pub genres: Vec<String>,
    pub description: Option<String>,
}

/// Raw row shape; genres arrive as the JSON text column
#[derive(sqlx::FromRow)]
struct BookRow {
    id: String,
    title: String,
    published: i64,
    author_id: String,
    genres: String,
    image_id: Option<String>,
    description: Option<String>,
}

impl From<BookRow> for BookRecord {
    fn from(row: BookRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            published: row.published,
            author_id: row.author_id,
            genres: json_to_vec(&row.genres),
            image_id: row.image_id,
            description: row.description,
        }
    }
}

const SELECT_COLUMNS: &str = "id, title, published, author_id, genres, image_id, description";

pub struct BooksRepository {
    pool: SqlitePool,
}

impl BooksRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Persist a new book. A unique-constraint violation on the title is
    /// classified as `DUPLICATE_BOOK_TITLE`.
    pub async fn insert(&self, book: CreateBook) -> Result<BookRecord> {
        let id = Uuid::new_v4().to_string();
        let genres = vec_to_json(&book.genres);

        let result = sqlx::query(
            "INSERT INTO books (id, title, published, author_id, genres, description) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&book.title)
        .bind(book.published)
        .bind(&book.author_id)
        .bind(&genres)
        .bind(&book.description)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(CatalogError::DuplicateBookTitle(book.title).into());
            }
            Err(e) => return Err(e.into()),
        }

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("book vanished after insert"))
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<BookRecord>> {
        let row = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Into::into))
    }

    pub async fn list_all(&self) -> Result<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!("SELECT {SELECT_COLUMNS} FROM books"))
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_author(&self, author_id: &str) -> Result<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books WHERE author_id = ?"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_genre(&self, genre: &str) -> Result<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books WHERE {}",
            json_array_contains_sql("genres")
        ))
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    pub async fn list_by_author_and_genre(
        &self,
        author_id: &str,
        genre: &str,
    ) -> Result<Vec<BookRecord>> {
        let rows = sqlx::query_as::<_, BookRow>(&format!(
            "SELECT {SELECT_COLUMNS} FROM books WHERE author_id = ? AND {}",
            json_array_contains_sql("genres")
        ))
        .bind(author_id)
        .bind(genre)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Distinct genre strings across all books, in store order. Callers must
    /// not assume the result is sorted.
    pub async fn distinct_genres(&self) -> Result<Vec<String>> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT DISTINCT value FROM books, json_each(books.genres)")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|(g,)| g).collect())
    }

    /// Attach an uploaded image to a book
    pub async fn set_image(&self, id: &str, image_id: &str) -> Result<Option<BookRecord>> {
        let result = sqlx::query("UPDATE books SET image_id = ? WHERE id = ?")
            .bind(image_id)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

//! Image blob store
//!
//! Uploaded image bytes land here after streaming through the upload
//! resolvers; the REST route serves them back out by id. Chunking and
//! de-duplication are deliberately not this store's concern.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use super::sqlite_helpers::now_iso8601;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRecord {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
    pub created_at: String,
}

pub struct ImagesRepository {
    pool: SqlitePool,
}

impl ImagesRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Store an uploaded blob and return its record
    pub async fn insert(
        &self,
        filename: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<ImageRecord> {
        let id = Uuid::new_v4().to_string();
        let created_at = now_iso8601();

        sqlx::query(
            "INSERT INTO images (id, filename, content_type, data, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(filename)
        .bind(content_type)
        .bind(&data)
        .bind(&created_at)
        .execute(&self.pool)
        .await?;

        Ok(ImageRecord {
            id,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data,
            created_at,
        })
    }

    pub async fn get(&self, id: &str) -> Result<Option<ImageRecord>> {
        let record = sqlx::query_as::<_, ImageRecord>(
            "SELECT id, filename, content_type, data, created_at FROM images WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

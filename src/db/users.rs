//! Users repository
//!
//! Stores the bcrypt hash only; plaintext passwords never touch the store.

use anyhow::Result;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::errors::CatalogError;

use super::is_unique_violation;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub favorite_genre: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub favorite_genre: Option<String>,
    pub password_hash: String,
}

pub struct UsersRepository {
    pool: SqlitePool,
}

impl UsersRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new user. A unique-constraint violation on the username is
    /// classified as `DUPLICATE_USERNAME`, carrying the offending name.
    pub async fn insert(&self, user: CreateUser) -> Result<UserRecord> {
        let id = Uuid::new_v4().to_string();

        let result = sqlx::query(
            "INSERT INTO users (id, username, favorite_genre, password_hash) VALUES (?, ?, ?, ?)",
        )
        .bind(&id)
        .bind(&user.username)
        .bind(&user.favorite_genre)
        .bind(&user.password_hash)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(CatalogError::DuplicateUsername(user.username).into());
            }
            Err(e) => return Err(e.into()),
        }

        self.get_by_id(&id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("user vanished after insert"))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, favorite_genre, password_hash FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    pub async fn get_by_id(&self, id: &str) -> Result<Option<UserRecord>> {
        let record = sqlx::query_as::<_, UserRecord>(
            "SELECT id, username, favorite_genre, password_hash FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_database;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn insert_classifies_duplicate_username_with_offender() {
        let db = test_database().await;
        let users = db.users();

        users
            .insert(CreateUser {
                username: "u1".to_string(),
                favorite_genre: Some("g1".to_string()),
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let err = users
            .insert(CreateUser {
                username: "u1".to_string(),
                favorite_genre: None,
                password_hash: "other".to_string(),
            })
            .await
            .unwrap_err();

        let classified = err.downcast::<CatalogError>().expect("classified");
        assert_eq!(classified.code(), "DUPLICATE_USERNAME");
        assert!(classified.to_string().contains("u1"));
    }

    #[tokio::test]
    async fn lookup_by_username_and_id() {
        let db = test_database().await;
        let users = db.users();

        let created = users
            .insert(CreateUser {
                username: "u1".to_string(),
                favorite_genre: None,
                password_hash: "hash".to_string(),
            })
            .await
            .unwrap();

        let by_name = users.get_by_username("u1").await.unwrap().unwrap();
        assert_eq!(by_name.id, created.id);
        let by_id = users.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(by_id.username, "u1");
        assert!(users.get_by_username("nope").await.unwrap().is_none());
    }
}

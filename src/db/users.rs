//! User database operations

use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::error::{AppError, Result};

/// User record
///
/// The stored hash never reaches clients: it is skipped on serialization.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    #[serde(rename = "admin")]
    pub is_admin: bool,
    pub created_at: String,
}

/// Data for creating a user. The secret must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
}

/// User repository
pub struct UserRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> UserRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert a new user and return the stored record.
    pub async fn create(&self, new_user: &NewUser) -> Result<User> {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, is_admin, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(&id)
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.password_hash)
        .bind(&now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE") {
                AppError::Conflict("User already exists".to_string())
            } else {
                AppError::Database(e)
            }
        })?;

        self.find_by_id(&id)
            .await?
            .ok_or_else(|| AppError::Internal("Failed to fetch created user".to_string()))
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, is_admin, created_at
            FROM users
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::create_pool;

    fn sample_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            password_hash: "$argon2id$fake-hash".to_string(),
        }
    }

    #[tokio::test]
    async fn create_and_find_back() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(&pool);

        let user = repo.create(&sample_user("alice", "alice@x.com")).await.unwrap();
        assert_eq!(user.username, "alice");
        assert!(!user.is_admin);

        let by_email = repo.find_by_email("alice@x.com").await.unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_username = repo.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(by_username.id, user.id);
    }

    #[tokio::test]
    async fn absent_user_is_none_not_error() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(&pool);

        assert!(repo.find_by_email("nobody@x.com").await.unwrap().is_none());
        assert!(repo.find_by_username("nobody").await.unwrap().is_none());
        assert!(repo.find_by_id("missing-id").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_username_is_a_conflict() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(&pool);

        repo.create(&sample_user("alice", "a@x.com")).await.unwrap();
        let result = repo.create(&sample_user("alice", "b@x.com")).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn user_serialization_omits_password_hash() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let repo = UserRepository::new(&pool);

        let user = repo.create(&sample_user("alice", "a@x.com")).await.unwrap();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("password_hash").is_none());
        assert_eq!(json["admin"], serde_json::json!(false));
    }
}

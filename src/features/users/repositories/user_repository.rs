use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::error::{AppError, Result};
use crate::features::users::models::{CreateUser, User, UserRole};

/// Storage for user accounts
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new user. Fails with `Conflict` when the email is taken.
    async fn create(&self, data: &CreateUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    /// Lookup by lower-cased email
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn list(&self) -> Result<Vec<User>>;

    async fn set_banned(
        &self,
        id: Uuid,
        is_banned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>>;

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>>;
}

const USER_COLUMNS: &str =
    "id, email, display_name, password_hash, role, is_banned, created_at, updated_at";

/// Postgres-backed user storage
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, data: &CreateUser) -> Result<User> {
        let query = format!(
            r#"
            INSERT INTO users (id, email, display_name, password_hash, role, is_banned, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, FALSE, $6, $6)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(data.id)
            .bind(&data.email)
            .bind(&data.display_name)
            .bind(&data.password_hash)
            .bind(data.role)
            .bind(data.created_at)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    AppError::Conflict("Email already registered".to_string())
                }
                e => {
                    tracing::error!("Failed to create user: {:?}", e);
                    AppError::Database(e)
                }
            })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);

        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to get user by email: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn list(&self) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list users: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn set_banned(
        &self,
        id: Uuid,
        is_banned: bool,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET is_banned = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(is_banned)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update user ban flag: {:?}", e);
                AppError::Database(e)
            })
    }

    async fn set_role(
        &self,
        id: Uuid,
        role: UserRole,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<User>> {
        let query = format!(
            "UPDATE users SET role = $2, updated_at = $3 WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );

        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .bind(role)
            .bind(updated_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to update user role: {:?}", e);
                AppError::Database(e)
            })
    }
}

use bcrypt::{DEFAULT_COST, hash};
use sqlx::SqlitePool;

use crate::models::{RegisterRequest, User, UserResponse};
use crate::utils::{ApiError, ApiResult};

#[derive(Clone)]
pub struct UserService {
    pool: SqlitePool,
}

/// Emails are compared and stored lower-case
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl UserService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn create_user(&self, req: &RegisterRequest) -> ApiResult<User> {
        let email = normalize_email(&req.email);

        if self.find_by_email(&email).await?.is_some() {
            return Err(ApiError::EmailTaken);
        }

        let password_hash = hash(&req.password, DEFAULT_COST)
            .map_err(|err| ApiError::internal_error(format!("Failed to hash password: {}", err)))?;

        let full_name = req
            .full_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let result = sqlx::query("INSERT INTO users (email, password_hash, full_name) VALUES (?, ?, ?)")
            .bind(&email)
            .bind(&password_hash)
            .bind(full_name)
            .execute(&self.pool)
            .await
            .map_err(|err| match &err {
                sqlx::Error::Database(db) if db.is_unique_violation() => ApiError::EmailTaken,
                _ => ApiError::from(err),
            })?;

        let user_id = result.last_insert_rowid();
        tracing::info!("User registered: {} (ID: {})", email, user_id);

        self.fetch_user(user_id).await
    }

    pub async fn find_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE email = ?")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn get_user(&self, user_id: i64) -> ApiResult<UserResponse> {
        Ok(self.fetch_user(user_id).await?.into())
    }

    async fn fetch_user(&self, user_id: i64) -> ApiResult<User> {
        let user: Option<User> = sqlx::query_as("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        user.ok_or_else(|| ApiError::not_found("User"))
    }
}

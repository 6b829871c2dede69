//! PostgreSQL 用户 Repository 实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_common::UserId;
use club_errors::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::repositories::user::UserRepository;
use crate::domain::user::{HashedPassword, User, UserRole, UserStatus};

pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: &UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role, status, password_hash,
                   last_password_change_at, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user: {}", e)))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
            SELECT id, email, display_name, role, status, password_hash,
                   last_password_change_at, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to find user by email: {}", e)))?;

        row.map(UserRow::into_user).transpose()
    }

    async fn save(&self, user: &User) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, display_name, role, status, password_hash,
                               last_password_change_at, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (id) DO UPDATE SET
                email = EXCLUDED.email,
                display_name = EXCLUDED.display_name,
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                password_hash = EXCLUDED.password_hash,
                last_password_change_at = EXCLUDED.last_password_change_at,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id.0)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(user.status.as_str())
        .bind(&user.password_hash.0)
        .bind(user.last_password_change_at)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict("Email already registered")
            }
            _ => AppError::database(format!("Failed to save user: {}", e)),
        })?;

        Ok(())
    }

    async fn update_password(&self, user: &User) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, last_password_change_at = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(user.id.0)
        .bind(&user.password_hash.0)
        .bind(user.last_password_change_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update password: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found("User not found"));
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    status: String,
    password_hash: String,
    last_password_change_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> AppResult<User> {
        let role = UserRole::parse(&self.role).ok_or_else(|| {
            AppError::database(format!("Invalid role in database for user {}: {}", self.id, self.role))
        })?;
        let status = UserStatus::parse(&self.status).ok_or_else(|| {
            AppError::database(format!(
                "Invalid status in database for user {}: {}",
                self.id, self.status
            ))
        })?;

        Ok(User {
            id: UserId::from_uuid(self.id),
            email: self.email,
            display_name: self.display_name,
            role,
            status,
            password_hash: HashedPassword(self.password_hash),
            last_password_change_at: self.last_password_change_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

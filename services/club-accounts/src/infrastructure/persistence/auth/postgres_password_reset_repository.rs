//! PostgreSQL 密码重置令牌仓储实现

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_adapter_postgres::TransactionManager;
use club_common::UserId;
use club_errors::{AppError, AppResult};
use sqlx::{PgExecutor, PgPool};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::auth::{PasswordResetToken, PasswordResetTokenId};
use crate::domain::repositories::auth::PasswordResetRepository;

async fn insert_token<'e, E: PgExecutor<'e>>(
    executor: E,
    token: &PasswordResetToken,
) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO password_reset_tokens (
            id, user_id, token_hash, created_at, expires_at, consumed_at,
            requester_ip, user_agent
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(token.id.0)
    .bind(token.user_id.0)
    .bind(&token.token_hash)
    .bind(token.created_at)
    .bind(token.expires_at)
    .bind(token.consumed_at)
    .bind(&token.requester_ip)
    .bind(&token.user_agent)
    .execute(executor)
    .await
    .map_err(|e| {
        warn!(error = %e, "Failed to save password reset token");
        AppError::database(format!("Failed to save password reset token: {}", e))
    })?;

    Ok(())
}

async fn count_outstanding<'e, E: PgExecutor<'e>>(
    executor: E,
    user_id: &UserId,
    now: DateTime<Utc>,
) -> AppResult<u64> {
    let (count,): (i64,) = sqlx::query_as(
        r#"
        SELECT COUNT(*)
        FROM password_reset_tokens
        WHERE user_id = $1 AND consumed_at IS NULL AND expires_at > $2
        "#,
    )
    .bind(user_id.0)
    .bind(now)
    .fetch_one(executor)
    .await
    .map_err(|e| AppError::database(format!("Failed to count password reset tokens: {}", e)))?;

    Ok(count.max(0) as u64)
}

/// PostgreSQL 密码重置令牌仓储
pub struct PostgresPasswordResetRepository {
    pool: PgPool,
    tx_manager: TransactionManager,
}

impl PostgresPasswordResetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool.clone()),
            pool,
        }
    }
}

#[async_trait]
impl PasswordResetRepository for PostgresPasswordResetRepository {
    async fn create(&self, token: &PasswordResetToken) -> AppResult<()> {
        debug!(token_id = %token.id, user_id = %token.user_id, "Saving password reset token");
        insert_token(&self.pool, token).await
    }

    /// 锁住用户行后再计数与写入，同一用户的签发请求因此串行
    async fn create_within_limit(
        &self,
        token: &PasswordResetToken,
        max_outstanding: u64,
    ) -> AppResult<bool> {
        let mut tx = self.tx_manager.begin().await?;

        sqlx::query("SELECT id FROM users WHERE id = $1 FOR UPDATE")
            .bind(token.user_id.0)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to lock user row: {}", e)))?;

        let outstanding = count_outstanding(&mut *tx, &token.user_id, token.created_at).await?;
        if outstanding >= max_outstanding {
            TransactionManager::rollback(tx).await?;
            return Ok(false);
        }

        debug!(token_id = %token.id, user_id = %token.user_id, "Saving password reset token");
        insert_token(&mut *tx, token).await?;
        TransactionManager::commit(tx).await?;

        Ok(true)
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>> {
        let row = sqlx::query_as::<_, PasswordResetTokenRow>(
            r#"
            SELECT id, user_id, token_hash, created_at, expires_at, consumed_at,
                   requester_ip, user_agent
            FROM password_reset_tokens
            WHERE token_hash = $1
            ORDER BY (consumed_at IS NULL) DESC, created_at DESC
            LIMIT 1
            "#,
        )
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to find password reset token by hash");
            AppError::database(format!("Failed to find password reset token: {}", e))
        })?;

        Ok(row.map(PasswordResetTokenRow::into_token))
    }

    async fn mark_consumed_if_unconsumed(
        &self,
        id: &PasswordResetTokenId,
        at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET consumed_at = $2
            WHERE id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(id.0)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            warn!(error = %e, "Failed to mark password reset token as consumed");
            AppError::database(format!("Failed to mark token as consumed: {}", e))
        })?;

        Ok(result.rows_affected() == 1)
    }

    async fn count_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<u64> {
        count_outstanding(&self.pool, user_id, now).await
    }

    async fn consume_all_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET consumed_at = $2
            WHERE user_id = $1 AND consumed_at IS NULL
            "#,
        )
        .bind(user_id.0)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to revoke password reset tokens: {}", e)))?;

        Ok(result.rows_affected())
    }
}

#[derive(sqlx::FromRow)]
struct PasswordResetTokenRow {
    id: Uuid,
    user_id: Uuid,
    token_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    consumed_at: Option<DateTime<Utc>>,
    requester_ip: Option<String>,
    user_agent: Option<String>,
}

impl PasswordResetTokenRow {
    fn into_token(self) -> PasswordResetToken {
        PasswordResetToken {
            id: PasswordResetTokenId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            token_hash: self.token_hash,
            created_at: self.created_at,
            expires_at: self.expires_at,
            consumed_at: self.consumed_at,
            requester_ip: self.requester_ip,
            user_agent: self.user_agent,
        }
    }
}

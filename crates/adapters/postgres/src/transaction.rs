//! PostgreSQL 事务管理模块
//!
//! 事务使用 PostgreSQL 默认的 READ COMMITTED；需要串行的写入通过
//! 事务级咨询锁或行锁协调。

use club_errors::{AppError, AppResult};
use sqlx::{PgExecutor, PgPool, Postgres, Transaction};
use tracing::debug;

/// 事务管理器
#[derive(Clone)]
pub struct TransactionManager {
    pool: PgPool,
}

impl TransactionManager {
    /// 创建新的事务管理器
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 开始事务
    pub async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {}", e)))?;

        debug!("Transaction started");
        Ok(tx)
    }

    /// 提交事务
    pub async fn commit(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit transaction: {}", e)))
    }

    /// 回滚事务
    pub async fn rollback(tx: Transaction<'static, Postgres>) -> AppResult<()> {
        tx.rollback()
            .await
            .map_err(|e| AppError::database(format!("Failed to rollback transaction: {}", e)))
    }
}

/// 获取事务级咨询锁，随事务提交或回滚释放
///
/// 必须在事务内调用；在自动提交的连接上执行会立即释放。
pub async fn advisory_xact_lock<'e, E: PgExecutor<'e>>(executor: E, key: i64) -> AppResult<()> {
    sqlx::query("SELECT pg_advisory_xact_lock($1)")
        .bind(key)
        .execute(executor)
        .await
        .map_err(|e| AppError::database(format!("Failed to acquire advisory lock {}: {}", key, e)))?;

    debug!(key, "Advisory transaction lock acquired");
    Ok(())
}

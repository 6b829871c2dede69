//! 密码重置令牌仓储接口

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use club_common::UserId;
use club_errors::AppResult;

use crate::domain::auth::{PasswordResetToken, PasswordResetTokenId};

/// 密码重置令牌仓储接口
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    /// 保存新令牌
    async fn create(&self, token: &PasswordResetToken) -> AppResult<()>;

    /// 仅当用户未使用且未过期的令牌少于 `max_outstanding` 时保存
    ///
    /// 计数与写入是原子的，并发请求不会突破上限。返回 `false` 表示已达上限、未写入。
    async fn create_within_limit(
        &self,
        token: &PasswordResetToken,
        max_outstanding: u64,
    ) -> AppResult<bool>;

    /// 根据令牌哈希查找；同一哈希存在多条时优先返回未使用的最新一条
    async fn find_by_token_hash(&self, token_hash: &str) -> AppResult<Option<PasswordResetToken>>;

    /// 条件更新：仅当令牌尚未使用时标记为已使用
    ///
    /// 返回 `true` 表示本次调用赢得了消费权。
    async fn mark_consumed_if_unconsumed(
        &self,
        id: &PasswordResetTokenId,
        at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// 统计用户未使用且未过期的令牌
    async fn count_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        now: DateTime<Utc>,
    ) -> AppResult<u64>;

    /// 将用户所有未使用的令牌标记为已使用，返回影响条数
    async fn consume_all_outstanding_by_user_id(
        &self,
        user_id: &UserId,
        at: DateTime<Utc>,
    ) -> AppResult<u64>;
}

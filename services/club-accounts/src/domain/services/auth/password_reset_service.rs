//! 密码重置服务
//!
//! 令牌的签发与一次性消费。消费的"检查 + 标记"由仓储的条件更新保证原子性，
//! 不依赖进程内锁，多实例部署下同样成立。

use std::sync::Arc;

use chrono::Duration;
use club_common::{Clock, UserId};
use club_errors::{AppError, AppResult};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info, warn};

use crate::domain::auth::{
    ConsumeOutcome, IssuedToken, PasswordResetToken, RejectReason, RequestContext, TokenState,
    secret,
};
use crate::domain::repositories::auth::PasswordResetRepository;
use crate::infrastructure::observability::metrics;

/// 默认有效期（分钟）
pub const DEFAULT_TOKEN_TTL_MINUTES: i64 = 30;

/// 密码重置服务
pub struct PasswordResetService {
    password_reset_repo: Arc<dyn PasswordResetRepository>,
    clock: Arc<dyn Clock>,
    token_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(
        password_reset_repo: Arc<dyn PasswordResetRepository>,
        clock: Arc<dyn Clock>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            password_reset_repo,
            clock,
            token_ttl,
        }
    }

    /// 使用默认有效期创建
    pub fn with_default_ttl(
        password_reset_repo: Arc<dyn PasswordResetRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self::new(
            password_reset_repo,
            clock,
            Duration::minutes(DEFAULT_TOKEN_TTL_MINUTES),
        )
    }

    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// 签发密码重置令牌
    ///
    /// 不会使该用户之前签发的令牌失效。明文只随返回值出现一次。
    pub async fn issue(
        &self,
        user_id: &UserId,
        context: &RequestContext,
    ) -> AppResult<IssuedToken> {
        let (token, plaintext) = self.prepare(user_id, context)?;
        self.password_reset_repo.create(&token).await?;

        Ok(self.issued(token, plaintext))
    }

    /// 在未完成令牌数低于 `max_outstanding` 时签发；已达上限返回 `None`
    pub async fn issue_within_limit(
        &self,
        user_id: &UserId,
        context: &RequestContext,
        max_outstanding: u64,
    ) -> AppResult<Option<IssuedToken>> {
        let (token, plaintext) = self.prepare(user_id, context)?;
        if !self
            .password_reset_repo
            .create_within_limit(&token, max_outstanding)
            .await?
        {
            return Ok(None);
        }

        Ok(Some(self.issued(token, plaintext)))
    }

    fn prepare(
        &self,
        user_id: &UserId,
        context: &RequestContext,
    ) -> AppResult<(PasswordResetToken, SecretString)> {
        if user_id.0.is_nil() {
            return Err(AppError::validation("User ID must not be empty"));
        }

        let plaintext = secret::generate();
        let token_hash = secret::hash(plaintext.expose_secret());
        let token = PasswordResetToken::new(
            *user_id,
            token_hash,
            self.clock.now(),
            self.token_ttl,
            context,
        )?;

        Ok((token, plaintext))
    }

    fn issued(&self, token: PasswordResetToken, plaintext: SecretString) -> IssuedToken {
        metrics::record_token_issued();
        info!(
            user_id = %token.user_id,
            token_id = %token.id,
            expires_at = %token.expires_at,
            "Password reset token issued"
        );

        IssuedToken {
            token_id: token.id,
            plaintext,
            expires_at: token.expires_at,
        }
    }

    /// 消费密码重置令牌
    ///
    /// 无效、已使用、已过期均作为 [`ConsumeOutcome::Rejected`] 返回；
    /// 只有持久层故障才返回错误。
    pub async fn consume(&self, plaintext: &str) -> AppResult<ConsumeOutcome> {
        let outcome = self.try_consume(plaintext).await?;
        metrics::record_consume_outcome(outcome.label());

        match &outcome {
            ConsumeOutcome::Consumed { user_id } => {
                info!(user_id = %user_id, "Password reset token consumed");
            }
            ConsumeOutcome::Rejected(reason) => {
                warn!(reason = %reason, "Password reset token rejected");
            }
        }

        Ok(outcome)
    }

    async fn try_consume(&self, plaintext: &str) -> AppResult<ConsumeOutcome> {
        if !secret::is_well_formed(plaintext) {
            debug!("Malformed password reset token");
            return Ok(ConsumeOutcome::Rejected(RejectReason::Invalid));
        }

        let token_hash = secret::hash(plaintext);
        let Some(token) = self
            .password_reset_repo
            .find_by_token_hash(&token_hash)
            .await?
        else {
            return Ok(ConsumeOutcome::Rejected(RejectReason::Invalid));
        };

        let now = self.clock.now();
        match token.state_at(now) {
            TokenState::Consumed => Ok(ConsumeOutcome::Rejected(RejectReason::Used)),
            TokenState::Expired => Ok(ConsumeOutcome::Rejected(RejectReason::Expired)),
            TokenState::Active => {
                let won = self
                    .password_reset_repo
                    .mark_consumed_if_unconsumed(&token.id, now)
                    .await?;

                if won {
                    Ok(ConsumeOutcome::Consumed {
                        user_id: token.user_id,
                    })
                } else {
                    // 并发消费中落败的一方
                    debug!(token_id = %token.id, "Lost consume race");
                    Ok(ConsumeOutcome::Rejected(RejectReason::Used))
                }
            }
        }
    }

    /// 撤销用户所有未使用的令牌（标记为已使用），返回撤销数量
    pub async fn revoke_outstanding(&self, user_id: &UserId) -> AppResult<u64> {
        let revoked = self
            .password_reset_repo
            .consume_all_outstanding_by_user_id(user_id, self.clock.now())
            .await?;

        info!(user_id = %user_id, revoked, "Outstanding password reset tokens revoked");
        Ok(revoked)
    }

    /// 统计用户未使用且未过期的令牌数量
    pub async fn count_outstanding(&self, user_id: &UserId) -> AppResult<u64> {
        self.password_reset_repo
            .count_outstanding_by_user_id(user_id, self.clock.now())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::persistence::memory::InMemoryStore;
    use chrono::Utc;
    use club_common::ManualClock;
    use uuid::Uuid;

    fn service() -> (PasswordResetService, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemoryStore::new();
        let service = PasswordResetService::with_default_ttl(Arc::new(store), clock.clone());
        (service, clock)
    }

    #[tokio::test]
    async fn test_issue_rejects_nil_user() {
        let (service, _) = service();
        let result = service
            .issue(&UserId::from_uuid(Uuid::nil()), &RequestContext::default())
            .await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_issue_sets_absolute_expiry() {
        let (service, clock) = service();
        let issued = service
            .issue(&UserId::new(), &RequestContext::default())
            .await
            .unwrap();

        assert_eq!(issued.expires_at, clock.now() + Duration::minutes(30));
        assert!(secret::is_well_formed(issued.plaintext.expose_secret()));
    }

    #[tokio::test]
    async fn test_issue_with_out_of_range_ttl_fails() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let store = InMemoryStore::new();
        let service = PasswordResetService::new(
            Arc::new(store.clone()),
            clock,
            Duration::days(100_000_000),
        );
        let user_id = UserId::new();

        let result = service.issue(&user_id, &RequestContext::default()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
        assert!(store.tokens_for(&user_id).await.is_empty());
    }

    #[tokio::test]
    async fn test_issue_within_limit_stops_at_cap() {
        let (service, clock) = service();
        let user_id = UserId::new();
        let context = RequestContext::default();

        for _ in 0..2 {
            assert!(service.issue_within_limit(&user_id, &context, 2).await.unwrap().is_some());
        }
        assert!(service.issue_within_limit(&user_id, &context, 2).await.unwrap().is_none());
        assert_eq!(service.count_outstanding(&user_id).await.unwrap(), 2);

        // 过期的令牌不占名额
        clock.advance(Duration::minutes(30));
        assert!(service.issue_within_limit(&user_id, &context, 2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_malformed_token_is_invalid() {
        let (service, _) = service();

        let uppercase = "Z".repeat(64);
        for input in ["", "short", "not hex at all", uppercase.as_str()] {
            assert_eq!(
                service.consume(input).await.unwrap(),
                ConsumeOutcome::Rejected(RejectReason::Invalid)
            );
        }
    }

    #[tokio::test]
    async fn test_new_token_does_not_supersede_previous() {
        let (service, _) = service();
        let user_id = UserId::new();

        let first = service.issue(&user_id, &RequestContext::default()).await.unwrap();
        let second = service.issue(&user_id, &RequestContext::default()).await.unwrap();
        assert_eq!(service.count_outstanding(&user_id).await.unwrap(), 2);

        let outcome = service.consume(first.plaintext.expose_secret()).await.unwrap();
        assert_eq!(outcome.user_id(), Some(user_id));

        let outcome = service.consume(second.plaintext.expose_secret()).await.unwrap();
        assert_eq!(outcome.user_id(), Some(user_id));
    }

    #[tokio::test]
    async fn test_revoke_outstanding() {
        let (service, _) = service();
        let user_id = UserId::new();

        let first = service.issue(&user_id, &RequestContext::default()).await.unwrap();
        service.issue(&user_id, &RequestContext::default()).await.unwrap();
        service.consume(first.plaintext.expose_secret()).await.unwrap();

        assert_eq!(service.revoke_outstanding(&user_id).await.unwrap(), 1);
        assert_eq!(service.count_outstanding(&user_id).await.unwrap(), 0);
        assert_eq!(service.revoke_outstanding(&user_id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_expired_tokens_are_not_outstanding() {
        let (service, clock) = service();
        let user_id = UserId::new();

        service.issue(&user_id, &RequestContext::default()).await.unwrap();
        clock.advance(Duration::minutes(30));

        assert_eq!(service.count_outstanding(&user_id).await.unwrap(), 0);
    }
}

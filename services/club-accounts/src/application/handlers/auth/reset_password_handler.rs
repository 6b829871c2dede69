//! 重置密码处理器

use std::sync::Arc;

use async_trait::async_trait;
use club_common::{Clock, UserId};
use club_cqrs_core::CommandHandler;
use club_errors::{AppError, AppResult};
use tracing::{info, warn};

use crate::application::commands::auth::ResetPasswordCommand;
use crate::domain::auth::ConsumeOutcome;
use crate::domain::repositories::user::UserRepository;
use crate::domain::services::auth::PasswordResetService;
use crate::domain::user::Password;

/// 对外统一的拒绝信息，不区分无效、已使用、已过期
pub const INVALID_RESET_TOKEN_MESSAGE: &str = "Invalid or expired reset token";

/// 重置密码处理器
pub struct ResetPasswordHandler {
    password_reset_service: Arc<PasswordResetService>,
    user_repo: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
}

impl ResetPasswordHandler {
    pub fn new(
        password_reset_service: Arc<PasswordResetService>,
        user_repo: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            password_reset_service,
            user_repo,
            clock,
        }
    }

    async fn apply_new_password(&self, user_id: &UserId, new_password: Password) -> AppResult<()> {
        let mut user = self
            .user_repo
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;

        let hashed = new_password.hash()?;
        user.update_password(hashed, self.clock.now());
        self.user_repo.update_password(&user).await
    }
}

#[async_trait]
impl CommandHandler<ResetPasswordCommand> for ResetPasswordHandler {
    async fn handle(&self, command: ResetPasswordCommand) -> AppResult<()> {
        // 1. 先校验新密码，避免因密码不合格而白白消耗令牌
        let new_password = Password::new(&command.new_password)?;

        // 2. 消费令牌
        let user_id = match self.password_reset_service.consume(&command.token).await? {
            ConsumeOutcome::Consumed { user_id } => user_id,
            ConsumeOutcome::Rejected(reason) => {
                warn!(reason = %reason, "Password reset rejected");
                return Err(AppError::unauthenticated(INVALID_RESET_TOKEN_MESSAGE));
            }
        };

        // 3. 更新密码；令牌此时已不可再用，失败时用户需要重新申请
        if let Err(e) = self.apply_new_password(&user_id, new_password).await {
            warn!(
                user_id = %user_id,
                error = %e,
                "Reset token consumed but password was not updated"
            );
            return Err(e);
        }

        // 4. 撤销该用户其余未使用的令牌
        let revoked = self.password_reset_service.revoke_outstanding(&user_id).await?;

        info!(user_id = %user_id, revoked, "Password reset completed");
        Ok(())
    }
}

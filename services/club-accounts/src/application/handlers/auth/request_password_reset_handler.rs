//! 请求密码重置处理器

use std::sync::Arc;

use async_trait::async_trait;
use club_adapter_email::{EmailSender, EmailTemplate};
use club_config::PasswordResetConfig;
use club_cqrs_core::CommandHandler;
use club_errors::{AppError, AppResult};
use email_address::EmailAddress;
use secrecy::ExposeSecret;
use tracing::{error, info, warn};
use url::Url;

use crate::application::commands::auth::RequestPasswordResetCommand;
use crate::domain::auth::{IssuedToken, RequestContext};
use crate::domain::repositories::user::UserRepository;
use crate::domain::services::auth::PasswordResetService;
use crate::domain::user::{User, normalize_email};
use crate::infrastructure::observability::metrics;

const RESET_EMAIL_SUBJECT: &str = "Reset your Club password";

/// 请求密码重置处理器
///
/// 无论邮箱是否存在、是否被限流，都返回 `Ok(())`，避免泄露账户信息。
pub struct RequestPasswordResetHandler {
    user_repo: Arc<dyn UserRepository>,
    password_reset_service: Arc<PasswordResetService>,
    email_sender: Arc<dyn EmailSender>,
    templates: Arc<EmailTemplate>,
    reset_link_base_url: Url,
    max_outstanding_per_user: u64,
}

impl RequestPasswordResetHandler {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_reset_service: Arc<PasswordResetService>,
        email_sender: Arc<dyn EmailSender>,
        templates: Arc<EmailTemplate>,
        config: &PasswordResetConfig,
    ) -> Self {
        Self {
            user_repo,
            password_reset_service,
            email_sender,
            templates,
            reset_link_base_url: config.reset_link_base_url.clone(),
            max_outstanding_per_user: config.max_outstanding_per_user,
        }
    }

    fn reset_link(&self, plaintext: &str) -> String {
        let mut url = self.reset_link_base_url.clone();
        url.query_pairs_mut().append_pair("token", plaintext);
        url.to_string()
    }

    async fn deliver(&self, user: &User, issued: &IssuedToken) -> AppResult<()> {
        let reset_link = self.reset_link(issued.plaintext.expose_secret());
        let expires_in_minutes = self.password_reset_service.token_ttl().num_minutes();
        let (html, text) =
            self.templates
                .render_password_reset(&user.display_name, &reset_link, expires_in_minutes)?;

        self.email_sender
            .send_html_email(&user.email, RESET_EMAIL_SUBJECT, &html, Some(&text))
            .await
    }
}

#[async_trait]
impl CommandHandler<RequestPasswordResetCommand> for RequestPasswordResetHandler {
    async fn handle(&self, command: RequestPasswordResetCommand) -> AppResult<()> {
        // 1. 验证邮箱格式
        if !EmailAddress::is_valid(command.email.trim()) {
            return Err(AppError::validation("Invalid email address"));
        }
        let email = normalize_email(&command.email);

        // 2. 查找用户
        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            info!("Password reset requested for unknown email");
            return Ok(());
        };

        if !user.is_active() {
            warn!(user_id = %user.id, status = %user.status, "Inactive user requested password reset");
            return Ok(());
        }

        // 3. 签发令牌；计数与写入在仓储内原子完成
        let context = RequestContext::new(command.request_ip, command.user_agent);
        let Some(issued) = self
            .password_reset_service
            .issue_within_limit(&user.id, &context, self.max_outstanding_per_user)
            .await?
        else {
            let outstanding = self.password_reset_service.count_outstanding(&user.id).await?;
            warn!(
                user_id = %user.id,
                outstanding,
                limit = self.max_outstanding_per_user,
                "Too many outstanding password reset tokens"
            );
            metrics::record_issue_throttled();
            return Ok(());
        };

        // 4. 投递邮件；投递失败不改变响应
        match self.deliver(&user, &issued).await {
            Ok(()) => info!(user_id = %user.id, token_id = %issued.token_id, "Password reset email sent"),
            Err(e) => error!(
                user_id = %user.id,
                token_id = %issued.token_id,
                error = %e,
                "Failed to send password reset email"
            ),
        }

        Ok(())
    }
}

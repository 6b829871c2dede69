//! 重置密码命令

use club_cqrs_core::Command;
use serde::Deserialize;

/// 重置密码命令
#[derive(Clone, Deserialize)]
pub struct ResetPasswordCommand {
    /// 邮件中的明文令牌
    pub token: String,

    /// 新密码
    pub new_password: String,
}

impl ResetPasswordCommand {
    pub fn new(token: impl Into<String>, new_password: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            new_password: new_password.into(),
        }
    }
}

impl std::fmt::Debug for ResetPasswordCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResetPasswordCommand")
            .field("token", &"[REDACTED]")
            .field("new_password", &"[REDACTED]")
            .finish()
    }
}

impl Command for ResetPasswordCommand {
    type Result = ();
}

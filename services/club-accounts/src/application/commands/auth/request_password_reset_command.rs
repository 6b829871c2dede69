//! 请求密码重置命令

use club_cqrs_core::Command;
use serde::{Deserialize, Serialize};

/// 请求密码重置命令
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestPasswordResetCommand {
    /// 邮箱
    pub email: String,

    /// 请求方 IP（仅记录）
    #[serde(default)]
    pub request_ip: Option<String>,

    /// 请求方 User-Agent（仅记录）
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl RequestPasswordResetCommand {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            request_ip: None,
            user_agent: None,
        }
    }
}

impl Command for RequestPasswordResetCommand {
    type Result = ();
}

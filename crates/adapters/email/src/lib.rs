//! Email 适配器
//!
//! SMTP 邮件发送与内置模板渲染。邮件同时包含 HTML 与纯文本两部分。

mod client;
mod template;

pub use client::EmailClient;
pub use club_config::EmailConfig;
pub use template::EmailTemplate;

use club_errors::AppResult;

/// 邮件发送接口
#[async_trait::async_trait]
pub trait EmailSender: Send + Sync {
    /// 发送 HTML 邮件，附带可选的纯文本版本
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()>;
}

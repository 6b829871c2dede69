//! 邮件客户端实现

use std::time::Duration;

use club_errors::{AppError, AppResult};
use lettre::message::{Mailbox, MultiPart, SinglePart, header};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::ExposeSecret;
use tracing::{debug, info};

use crate::{EmailConfig, EmailSender};

#[derive(Debug, Clone)]
struct EmailMessage {
    to: String,
    subject: String,
    html_body: Option<String>,
    text_body: String,
}

/// SMTP 邮件客户端
pub struct EmailClient {
    config: EmailConfig,
}

impl EmailClient {
    pub fn new(config: EmailConfig) -> Self {
        Self { config }
    }

    fn build_transport(&self) -> AppResult<AsyncSmtpTransport<Tokio1Executor>> {
        let builder = if self.config.use_tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&self.config.smtp_host).map_err(
                |e| AppError::external_service(format!("Failed to create SMTP transport: {}", e)),
            )?
        } else {
            // 本地开发用的无 TLS 中继（如 mailpit）
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&self.config.smtp_host)
        };

        let mut builder = builder
            .port(self.config.smtp_port)
            .timeout(Some(Duration::from_secs(self.config.timeout_secs)));

        if !self.config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.expose_secret().to_string(),
            ));
        }

        Ok(builder.build())
    }

    fn build_message(&self, msg: &EmailMessage) -> AppResult<Message> {
        let from: Mailbox = format!("{} <{}>", self.config.from_name, self.config.from_email)
            .parse()
            .map_err(|e| AppError::internal(format!("Invalid from address: {}", e)))?;

        let to: Mailbox = msg
            .to
            .parse()
            .map_err(|e| AppError::validation(format!("Invalid to address: {}", e)))?;

        let text_part = SinglePart::builder()
            .header(header::ContentType::TEXT_PLAIN)
            .body(msg.text_body.clone());

        let body = match &msg.html_body {
            Some(html) => MultiPart::alternative().singlepart(text_part).singlepart(
                SinglePart::builder()
                    .header(header::ContentType::TEXT_HTML)
                    .body(html.clone()),
            ),
            None => MultiPart::alternative().singlepart(text_part),
        };

        Message::builder()
            .from(from)
            .to(to)
            .subject(&msg.subject)
            .multipart(body)
            .map_err(|e| AppError::internal(format!("Failed to build message: {}", e)))
    }

    async fn deliver(&self, msg: EmailMessage) -> AppResult<()> {
        let message = self.build_message(&msg)?;
        let transport = self.build_transport()?;

        transport
            .send(message)
            .await
            .map_err(|e| AppError::external_service(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl EmailSender for EmailClient {
    async fn send_html_email(
        &self,
        to: &str,
        subject: &str,
        html_body: &str,
        text_body: Option<&str>,
    ) -> AppResult<()> {
        debug!(to = %to, subject = %subject, "Sending HTML email");

        self.deliver(EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            html_body: Some(html_body.to_string()),
            text_body: text_body.unwrap_or_default().to_string(),
        })
        .await?;

        info!(to = %to, subject = %subject, "HTML email sent");
        Ok(())
    }
}

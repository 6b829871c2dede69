//! 邮件模板系统

use club_errors::{AppError, AppResult};
use tera::Tera;
use tracing::debug;

const PASSWORD_RESET_HTML: &str = include_str!("../templates/password_reset.html");
const PASSWORD_RESET_TEXT: &str = include_str!("../templates/password_reset.txt");

/// 邮件模板管理器
pub struct EmailTemplate {
    tera: Tera,
}

impl EmailTemplate {
    /// 使用内置模板
    pub fn builtin() -> AppResult<Self> {
        Self::from_strings([
            ("password_reset.html", PASSWORD_RESET_HTML),
            ("password_reset.txt", PASSWORD_RESET_TEXT),
        ])
    }

    fn from_strings<'a>(templates: impl IntoIterator<Item = (&'a str, &'a str)>) -> AppResult<Self> {
        let mut tera = Tera::default();

        for (name, content) in templates {
            tera.add_raw_template(name, content).map_err(|e| {
                AppError::internal(format!("Failed to add template {}: {}", name, e))
            })?;
        }

        debug!("Email templates loaded");
        Ok(Self { tera })
    }

    /// 渲染密码重置邮件，返回 (html, text)
    pub fn render_password_reset(
        &self,
        user_name: &str,
        reset_link: &str,
        expires_in_minutes: i64,
    ) -> AppResult<(String, String)> {
        let mut context = tera::Context::new();
        context.insert("user_name", user_name);
        context.insert("reset_link", reset_link);
        context.insert("expires_in_minutes", &expires_in_minutes);

        let html = self
            .tera
            .render("password_reset.html", &context)
            .map_err(|e| AppError::internal(format!("Failed to render HTML template: {}", e)))?;

        let text = self
            .tera
            .render("password_reset.txt", &context)
            .map_err(|e| AppError::internal(format!("Failed to render text template: {}", e)))?;

        Ok((html, text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_password_reset() {
        let template = EmailTemplate::builtin().unwrap();
        let link = "https://app.travel-club.example/reset-password?token=abc123";

        let (html, text) = template.render_password_reset("Ana", link, 30).unwrap();

        assert!(text.contains("Hello Ana"));
        assert!(text.contains(link));
        assert!(text.contains("30 minutes"));
        assert!(html.contains("Hello Ana"));
        assert!(html.contains("abc123"));
    }

    #[test]
    fn test_html_escapes_display_name() {
        let template = EmailTemplate::builtin().unwrap();

        let (html, _) = template
            .render_password_reset("<b>Ana</b>", "https://example.com/r?token=x", 30)
            .unwrap();

        assert!(!html.contains("<b>Ana</b>"));
    }

    #[test]
    fn test_invalid_template_fails() {
        let result = EmailTemplate::from_strings([("broken.html", "{{ unclosed")]);
        assert!(matches!(result, Err(AppError::Internal(_))));
    }
}

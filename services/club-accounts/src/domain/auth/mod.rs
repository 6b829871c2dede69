//! 认证领域模型

mod password_reset_token;
pub mod secret;

pub use password_reset_token::*;

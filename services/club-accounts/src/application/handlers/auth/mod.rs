//! 认证处理器

pub mod request_password_reset_handler;
pub mod reset_password_handler;

pub use request_password_reset_handler::*;
pub use reset_password_handler::*;

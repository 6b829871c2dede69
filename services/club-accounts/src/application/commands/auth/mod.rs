//! 认证命令

pub mod request_password_reset_command;
pub mod reset_password_command;

pub use request_password_reset_command::*;
pub use reset_password_command::*;

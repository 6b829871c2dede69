//! 命令处理器

pub mod assignment;
pub mod auth;

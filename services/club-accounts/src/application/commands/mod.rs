//! 命令定义

pub mod assignment;
pub mod auth;

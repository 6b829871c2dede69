//! 应用层
//!
//! 包含命令和处理器

pub mod commands;
pub mod handlers;

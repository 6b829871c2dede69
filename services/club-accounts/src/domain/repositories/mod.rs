//! 仓储接口

pub mod assignment;
pub mod auth;
pub mod user;

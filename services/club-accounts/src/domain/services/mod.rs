//! 领域服务

pub mod assignment;
pub mod auth;

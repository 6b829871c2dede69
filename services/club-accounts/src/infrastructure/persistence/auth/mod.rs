//! 认证持久化实现

mod postgres_password_reset_repository;

pub use postgres_password_reset_repository::*;

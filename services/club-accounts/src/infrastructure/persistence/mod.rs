//! 持久化实现

pub mod assignment;
pub mod auth;
pub mod memory;
pub mod postgres_unit_of_work;
pub mod tx_repositories;
pub mod user;

pub use postgres_unit_of_work::*;

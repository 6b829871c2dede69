//! 领域层

pub mod assignment;
pub mod auth;
pub mod repositories;
pub mod services;
pub mod unit_of_work;
pub mod user;

//! 销售分配命令

pub mod backfill_seller_assignments_command;

pub use backfill_seller_assignments_command::*;

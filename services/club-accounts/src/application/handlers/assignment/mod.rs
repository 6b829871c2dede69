//! 销售分配处理器

pub mod backfill_seller_assignments_handler;

pub use backfill_seller_assignments_handler::*;

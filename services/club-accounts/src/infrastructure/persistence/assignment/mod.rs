//! 销售分配持久化实现

mod postgres_client_repository;

pub use postgres_client_repository::{PostgresClientRepository, SELLER_ASSIGNMENT_LOCK_KEY};
pub(crate) use postgres_client_repository::{
    select_eligible_candidates, select_unassigned, update_seller_if_unassigned,
};

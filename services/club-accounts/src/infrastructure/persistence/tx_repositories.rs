//! 事务感知的 Repository 实现
//!
//! 这些 Repository 使用共享的 Transaction 而非 PgPool。

use std::sync::Arc;

use async_trait::async_trait;
use club_adapter_postgres::advisory_xact_lock;
use club_common::{ClientId, SellerId};
use club_errors::{AppError, AppResult};
use sqlx::{Postgres, Transaction};
use tokio::sync::Mutex;

use crate::domain::assignment::{Candidate, UnassignedClient};
use crate::domain::repositories::assignment::{ClientRepository, SellerRepository};

use super::assignment::{
    SELLER_ASSIGNMENT_LOCK_KEY, select_eligible_candidates, select_unassigned,
    update_seller_if_unassigned,
};

/// 共享事务类型
pub type SharedTx = Arc<Mutex<Option<Transaction<'static, Postgres>>>>;

/// 宏：定义一个简单的 TxRepository 结构体
macro_rules! define_tx_repo {
    ($name:ident) => {
        pub struct $name {
            tx: SharedTx,
        }

        impl $name {
            pub fn new(tx: SharedTx) -> Self {
                Self { tx }
            }
        }
    };
}

define_tx_repo!(TxSellerRepository);
define_tx_repo!(TxClientRepository);

fn consumed() -> AppError {
    AppError::internal("Transaction consumed")
}

// =============================================================================
// SellerRepository 实现
// =============================================================================

#[async_trait]
impl SellerRepository for TxSellerRepository {
    /// 先取事务级咨询锁，再计算负载；并发的分配事务因此依次读取到彼此提交后的负载
    async fn find_eligible_candidates(&self) -> AppResult<Vec<Candidate>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        advisory_xact_lock(&mut **tx, SELLER_ASSIGNMENT_LOCK_KEY).await?;
        select_eligible_candidates(&mut **tx).await
    }
}

// =============================================================================
// ClientRepository 实现
// =============================================================================

#[async_trait]
impl ClientRepository for TxClientRepository {
    async fn find_unassigned(&self, limit: u32) -> AppResult<Vec<UnassignedClient>> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        select_unassigned(&mut **tx, limit).await
    }

    async fn assign_seller_if_unassigned(
        &self,
        client_id: &ClientId,
        seller_id: &SellerId,
    ) -> AppResult<bool> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or_else(consumed)?;

        update_seller_if_unassigned(&mut **tx, client_id, seller_id).await
    }
}

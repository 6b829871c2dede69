//! PostgreSQL Unit of Work 实现
//!
//! 使用 SQLx Transaction 提供事务协调能力。

use std::sync::Arc;

use async_trait::async_trait;
use club_adapter_postgres::TransactionManager;
use club_errors::{AppError, AppResult};
use sqlx::PgPool;
use tokio::sync::Mutex;

use crate::domain::repositories::assignment::{ClientRepository, SellerRepository};
use crate::domain::unit_of_work::{UnitOfWork, UnitOfWorkFactory};

use super::tx_repositories::{SharedTx, TxClientRepository, TxSellerRepository};

/// PostgreSQL Unit of Work 工厂
///
/// 事务为 READ COMMITTED，一致性由咨询锁与条件更新保证。
pub struct PostgresUnitOfWorkFactory {
    tx_manager: TransactionManager,
}

impl PostgresUnitOfWorkFactory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            tx_manager: TransactionManager::new(pool),
        }
    }
}

#[async_trait]
impl UnitOfWorkFactory for PostgresUnitOfWorkFactory {
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>> {
        let tx = self.tx_manager.begin().await?;
        Ok(Box::new(PostgresUnitOfWork::new(Arc::new(Mutex::new(Some(tx))))))
    }
}

/// PostgreSQL Unit of Work 实现
///
/// 所有 Repository 操作都在同一个事务中执行。
pub struct PostgresUnitOfWork {
    tx: SharedTx,
    seller_repo: TxSellerRepository,
    client_repo: TxClientRepository,
}

impl PostgresUnitOfWork {
    fn new(tx: SharedTx) -> Self {
        Self {
            seller_repo: TxSellerRepository::new(tx.clone()),
            client_repo: TxClientRepository::new(tx.clone()),
            tx,
        }
    }
}

#[async_trait]
impl UnitOfWork for PostgresUnitOfWork {
    fn sellers(&self) -> &dyn SellerRepository {
        &self.seller_repo
    }

    fn clients(&self) -> &dyn ClientRepository {
        &self.client_repo
    }

    async fn commit(self: Box<Self>) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        TransactionManager::commit(tx).await
    }

    async fn rollback(self: Box<Self>) -> AppResult<()> {
        let tx = self
            .tx
            .lock()
            .await
            .take()
            .ok_or_else(|| AppError::internal("Transaction already consumed"))?;

        TransactionManager::rollback(tx).await
    }
}

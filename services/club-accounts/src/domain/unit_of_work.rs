//! Unit of Work 模式
//!
//! 销售分配需要"读取候选 → 选择 → 写入"在同一事务内完成。

use async_trait::async_trait;
use club_errors::AppResult;

use crate::domain::repositories::assignment::{ClientRepository, SellerRepository};

/// Unit of Work trait
///
/// ```ignore
/// let uow = uow_factory.begin().await?;
///
/// let candidates = uow.sellers().find_eligible_candidates().await?;
/// uow.clients().assign_seller_if_unassigned(&client_id, &seller_id).await?;
///
/// uow.commit().await?;
/// ```
#[async_trait]
pub trait UnitOfWork: Send + Sync {
    /// 获取销售 Repository
    fn sellers(&self) -> &dyn SellerRepository;

    /// 获取客户 Repository
    fn clients(&self) -> &dyn ClientRepository;

    /// 提交事务
    async fn commit(self: Box<Self>) -> AppResult<()>;

    /// 回滚事务
    async fn rollback(self: Box<Self>) -> AppResult<()>;
}

/// Unit of Work 工厂 trait
#[async_trait]
pub trait UnitOfWorkFactory: Send + Sync {
    /// 开始新的事务
    async fn begin(&self) -> AppResult<Box<dyn UnitOfWork>>;
}

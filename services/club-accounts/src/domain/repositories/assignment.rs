//! 销售分配仓储接口

use async_trait::async_trait;
use club_common::{ClientId, SellerId};
use club_errors::AppResult;

use crate::domain::assignment::{Candidate, UnassignedClient};

/// 销售仓储
#[async_trait]
pub trait SellerRepository: Send + Sync {
    /// 读取可参与分配的销售及其当前负载
    ///
    /// 返回顺序稳定（按销售 ID），选择器的平局规则依赖该顺序。
    async fn find_eligible_candidates(&self) -> AppResult<Vec<Candidate>>;
}

/// 客户仓储
#[async_trait]
pub trait ClientRepository: Send + Sync {
    /// 尚未分配销售的客户，按创建时间升序
    async fn find_unassigned(&self, limit: u32) -> AppResult<Vec<UnassignedClient>>;

    /// 条件更新：仅当客户仍未分配时写入销售
    async fn assign_seller_if_unassigned(
        &self,
        client_id: &ClientId,
        seller_id: &SellerId,
    ) -> AppResult<bool>;
}

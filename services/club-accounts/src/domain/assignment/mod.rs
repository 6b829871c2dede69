//! 销售分配领域模型

use club_common::{ClientId, SellerId};
use club_config::AssignmentPolicy;
use serde::{Deserialize, Serialize};

/// 候选销售
///
/// 每次选择前从持久层重新读取，`load` 为当前已分配的客户数。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub seller_id: SellerId,
    pub load: u64,
    pub eligible: bool,
}

impl Candidate {
    pub fn new(seller_id: SellerId, load: u64) -> Self {
        Self {
            seller_id,
            load,
            eligible: true,
        }
    }

    pub fn ineligible(seller_id: SellerId, load: u64) -> Self {
        Self {
            seller_id,
            load,
            eligible: false,
        }
    }
}

/// 选择策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SelectionPolicy {
    /// 按 1/(1+load) 加权随机
    #[default]
    WeightedRandom,
    /// 负载最小者，平局取输入顺序中靠前的
    LeastLoaded,
}

impl From<AssignmentPolicy> for SelectionPolicy {
    fn from(policy: AssignmentPolicy) -> Self {
        match policy {
            AssignmentPolicy::Weighted => Self::WeightedRandom,
            AssignmentPolicy::LeastLoaded => Self::LeastLoaded,
        }
    }
}

/// 待分配客户
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnassignedClient {
    pub id: ClientId,
    pub display_name: String,
}

/// 一次回填的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillReport {
    /// 成功分配
    pub assigned: u64,
    /// 没有可用销售
    pub skipped_no_candidate: u64,
    /// 已被并发分配
    pub lost_race: u64,
}

impl BackfillReport {
    pub fn processed(&self) -> u64 {
        self.assigned + self.skipped_no_candidate + self.lost_race
    }
}

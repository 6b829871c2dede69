//! 回填销售分配命令

use club_cqrs_core::Command;
use serde::{Deserialize, Serialize};

use crate::domain::assignment::BackfillReport;

/// 为尚未分配销售的客户执行一轮分配
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackfillSellerAssignmentsCommand {
    /// 本轮最多处理的客户数；为空时使用配置的批大小
    pub limit: Option<u32>,
}

impl Command for BackfillSellerAssignmentsCommand {
    type Result = BackfillReport;
}

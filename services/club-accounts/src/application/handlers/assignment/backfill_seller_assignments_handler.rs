//! 回填销售分配处理器
//!
//! 每个客户一个事务：读取候选 → 选择 → 条件写入 → 提交。
//! 事务未提交即被丢弃时等同回滚。

use std::sync::Arc;

use async_trait::async_trait;
use club_cqrs_core::CommandHandler;
use club_errors::AppResult;
use tracing::{debug, info};

use crate::application::commands::assignment::BackfillSellerAssignmentsCommand;
use crate::domain::assignment::{BackfillReport, UnassignedClient};
use crate::domain::repositories::assignment::ClientRepository;
use crate::domain::services::assignment::SellerSelector;
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::infrastructure::observability::metrics;

enum AssignOutcome {
    Assigned,
    NoCandidate,
    LostRace,
}

impl AssignOutcome {
    fn label(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::NoCandidate => "no_candidate",
            Self::LostRace => "lost_race",
        }
    }
}

/// 回填销售分配处理器
pub struct BackfillSellerAssignmentsHandler {
    uow_factory: Arc<dyn UnitOfWorkFactory>,
    client_repo: Arc<dyn ClientRepository>,
    selector: Arc<SellerSelector>,
    batch_size: u32,
}

impl BackfillSellerAssignmentsHandler {
    pub fn new(
        uow_factory: Arc<dyn UnitOfWorkFactory>,
        client_repo: Arc<dyn ClientRepository>,
        selector: Arc<SellerSelector>,
        batch_size: u32,
    ) -> Self {
        Self {
            uow_factory,
            client_repo,
            selector,
            batch_size,
        }
    }

    async fn assign_one(&self, client: &UnassignedClient) -> AppResult<AssignOutcome> {
        let uow = self.uow_factory.begin().await?;

        let candidates = uow.sellers().find_eligible_candidates().await?;
        let Some(seller_id) = self.selector.select_assignee(&candidates) else {
            uow.rollback().await?;
            return Ok(AssignOutcome::NoCandidate);
        };

        let assigned = uow
            .clients()
            .assign_seller_if_unassigned(&client.id, &seller_id)
            .await?;

        if assigned {
            uow.commit().await?;
            debug!(client_id = %client.id, seller_id = %seller_id, "Client assigned");
            Ok(AssignOutcome::Assigned)
        } else {
            uow.rollback().await?;
            Ok(AssignOutcome::LostRace)
        }
    }
}

#[async_trait]
impl CommandHandler<BackfillSellerAssignmentsCommand> for BackfillSellerAssignmentsHandler {
    async fn handle(&self, command: BackfillSellerAssignmentsCommand) -> AppResult<BackfillReport> {
        let limit = command.limit.unwrap_or(self.batch_size);
        let clients = self.client_repo.find_unassigned(limit).await?;

        let mut report = BackfillReport::default();
        for client in &clients {
            let outcome = self.assign_one(client).await?;
            metrics::record_assignment(outcome.label());

            match outcome {
                AssignOutcome::Assigned => report.assigned += 1,
                AssignOutcome::NoCandidate => report.skipped_no_candidate += 1,
                AssignOutcome::LostRace => report.lost_race += 1,
            }
        }

        info!(
            candidates = clients.len(),
            assigned = report.assigned,
            skipped_no_candidate = report.skipped_no_candidate,
            lost_race = report.lost_race,
            "Seller backfill finished"
        );

        Ok(report)
    }
}

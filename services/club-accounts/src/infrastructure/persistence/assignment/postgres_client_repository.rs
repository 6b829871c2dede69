//! PostgreSQL 销售分配仓储实现
//!
//! 查询以 `PgExecutor` 为参数，连接池与事务两种实现共用。

use async_trait::async_trait;
use club_common::{ClientId, SellerId};
use club_errors::{AppError, AppResult};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::assignment::{Candidate, UnassignedClient};
use crate::domain::repositories::assignment::ClientRepository;

/// 串行化分配事务的咨询锁键
pub const SELLER_ASSIGNMENT_LOCK_KEY: i64 = 0x636c_7562_7365_6c6c;

pub(crate) async fn select_eligible_candidates<'e, E: PgExecutor<'e>>(
    executor: E,
) -> AppResult<Vec<Candidate>> {
    let rows: Vec<(Uuid, i64)> = sqlx::query_as(
        r#"
        SELECT s.id, COUNT(c.id) AS load
        FROM sellers s
        LEFT JOIN clients c ON c.seller_id = s.id
        WHERE s.active
        GROUP BY s.id
        ORDER BY s.id
        "#,
    )
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database(format!("Failed to load seller candidates: {}", e)))?;

    Ok(rows
        .into_iter()
        .map(|(id, load)| Candidate::new(SellerId::from_uuid(id), load.max(0) as u64))
        .collect())
}

pub(crate) async fn select_unassigned<'e, E: PgExecutor<'e>>(
    executor: E,
    limit: u32,
) -> AppResult<Vec<UnassignedClient>> {
    let rows: Vec<(Uuid, String)> = sqlx::query_as(
        r#"
        SELECT id, display_name
        FROM clients
        WHERE seller_id IS NULL
        ORDER BY created_at, id
        LIMIT $1
        "#,
    )
    .bind(i64::from(limit))
    .fetch_all(executor)
    .await
    .map_err(|e| AppError::database(format!("Failed to load unassigned clients: {}", e)))?;

    Ok(rows
        .into_iter()
        .map(|(id, display_name)| UnassignedClient {
            id: ClientId::from_uuid(id),
            display_name,
        })
        .collect())
}

pub(crate) async fn update_seller_if_unassigned<'e, E: PgExecutor<'e>>(
    executor: E,
    client_id: &ClientId,
    seller_id: &SellerId,
) -> AppResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE clients
        SET seller_id = $2
        WHERE id = $1 AND seller_id IS NULL
        "#,
    )
    .bind(client_id.0)
    .bind(seller_id.0)
    .execute(executor)
    .await
    .map_err(|e| AppError::database(format!("Failed to assign seller: {}", e)))?;

    Ok(result.rows_affected() == 1)
}

/// PostgreSQL 客户仓储（非事务）
pub struct PostgresClientRepository {
    pool: PgPool,
}

impl PostgresClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PostgresClientRepository {
    async fn find_unassigned(&self, limit: u32) -> AppResult<Vec<UnassignedClient>> {
        select_unassigned(&self.pool, limit).await
    }

    async fn assign_seller_if_unassigned(
        &self,
        client_id: &ClientId,
        seller_id: &SellerId,
    ) -> AppResult<bool> {
        update_seller_if_unassigned(&self.pool, client_id, seller_id).await
    }
}

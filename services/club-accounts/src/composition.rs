//! 组装根
//!
//! 按 `AppConfig` 创建服务与处理器。生产环境使用 PostgreSQL 仓储与 SMTP 客户端，
//! 测试可以换成内存存储。

use std::sync::Arc;

use chrono::Duration;
use club_adapter_email::{EmailClient, EmailSender, EmailTemplate};
use club_bootstrap::Infrastructure;
use club_common::{Clock, SystemClock};
use club_config::AppConfig;
use club_errors::AppResult;
use sqlx::PgPool;
use tracing::info;

use crate::application::handlers::assignment::BackfillSellerAssignmentsHandler;
use crate::application::handlers::auth::{RequestPasswordResetHandler, ResetPasswordHandler};
use crate::domain::assignment::SelectionPolicy;
use crate::domain::repositories::assignment::ClientRepository;
use crate::domain::repositories::auth::PasswordResetRepository;
use crate::domain::repositories::user::UserRepository;
use crate::domain::services::assignment::SellerSelector;
use crate::domain::services::auth::PasswordResetService;
use crate::domain::unit_of_work::UnitOfWorkFactory;
use crate::infrastructure::persistence::PostgresUnitOfWorkFactory;
use crate::infrastructure::persistence::assignment::PostgresClientRepository;
use crate::infrastructure::persistence::auth::PostgresPasswordResetRepository;
use crate::infrastructure::persistence::memory::InMemoryStore;
use crate::infrastructure::persistence::user::PostgresUserRepository;

/// 仓储集合
#[derive(Clone)]
pub struct AccountsRepositories {
    pub password_resets: Arc<dyn PasswordResetRepository>,
    pub users: Arc<dyn UserRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub unit_of_work: Arc<dyn UnitOfWorkFactory>,
}

impl AccountsRepositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            password_resets: Arc::new(PostgresPasswordResetRepository::new(pool.clone())),
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            clients: Arc::new(PostgresClientRepository::new(pool.clone())),
            unit_of_work: Arc::new(PostgresUnitOfWorkFactory::new(pool)),
        }
    }

    pub fn in_memory(store: &InMemoryStore) -> Self {
        Self {
            password_resets: Arc::new(store.clone()),
            users: Arc::new(store.clone()),
            clients: Arc::new(store.clone()),
            unit_of_work: Arc::new(store.clone()),
        }
    }
}

/// 账户服务的全部处理器
pub struct AccountsServices {
    pub password_reset_service: Arc<PasswordResetService>,
    pub request_password_reset: RequestPasswordResetHandler,
    pub reset_password: ResetPasswordHandler,
    pub backfill_seller_assignments: BackfillSellerAssignmentsHandler,
}

impl AccountsServices {
    /// 使用 PostgreSQL 仓储、SMTP 客户端与系统时钟
    pub fn from_infrastructure(infra: &Infrastructure) -> AppResult<Self> {
        let config = infra.config();

        Self::build(
            config,
            AccountsRepositories::postgres(infra.postgres_pool()),
            Arc::new(EmailClient::new(config.email.clone())),
            Arc::new(SystemClock),
        )
    }

    pub fn build(
        config: &AppConfig,
        repos: AccountsRepositories,
        email_sender: Arc<dyn EmailSender>,
        clock: Arc<dyn Clock>,
    ) -> AppResult<Self> {
        let reset = &config.password_reset;
        let password_reset_service = Arc::new(PasswordResetService::new(
            repos.password_resets.clone(),
            clock.clone(),
            Duration::minutes(reset.token_ttl_minutes),
        ));

        let request_password_reset = RequestPasswordResetHandler::new(
            repos.users.clone(),
            password_reset_service.clone(),
            email_sender,
            Arc::new(EmailTemplate::builtin()?),
            reset,
        );
        let reset_password =
            ResetPasswordHandler::new(password_reset_service.clone(), repos.users.clone(), clock);

        let assignment = &config.seller_assignment;
        let selector = SellerSelector::from_seed_option(
            SelectionPolicy::from(assignment.policy),
            assignment.seed,
        );
        let backfill_seller_assignments = BackfillSellerAssignmentsHandler::new(
            repos.unit_of_work,
            repos.clients,
            Arc::new(selector),
            assignment.batch_size,
        );

        info!(
            token_ttl_minutes = reset.token_ttl_minutes,
            max_outstanding_per_user = reset.max_outstanding_per_user,
            policy = ?assignment.policy,
            "Accounts services assembled"
        );

        Ok(Self {
            password_reset_service,
            request_password_reset,
            reset_password,
            backfill_seller_assignments,
        })
    }
}

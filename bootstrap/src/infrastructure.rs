//! 基础设施资源管理

use club_adapter_postgres::{PostgresConfig, check_connection, create_pool};
use club_config::AppConfig;
use club_errors::{AppError, AppResult};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use tracing::info;

use crate::{RuntimeConfig, init_runtime};

/// 基础设施资源容器
pub struct Infrastructure {
    config: AppConfig,
    postgres_pool: PgPool,
    metrics: PrometheusHandle,
}

impl Infrastructure {
    /// 加载配置并初始化运行时与数据库连接池
    pub async fn start(runtime: RuntimeConfig) -> AppResult<Self> {
        let config = AppConfig::load(&runtime.config_dir)
            .map_err(|e| AppError::internal(format!("Failed to load config: {}", e)))?;
        let metrics = init_runtime(&config)?;

        let pg_config = PostgresConfig::new(config.database.url.clone())
            .with_max_connections(config.database.max_connections);
        let postgres_pool = create_pool(&pg_config).await?;
        check_connection(&postgres_pool).await?;
        info!("Infrastructure ready");

        Ok(Self {
            config,
            postgres_pool,
            metrics,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn postgres_pool(&self) -> PgPool {
        self.postgres_pool.clone()
    }

    /// 当前指标的 Prometheus 文本
    pub fn render_metrics(&self) -> String {
        self.metrics.render()
    }
}

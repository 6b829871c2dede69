//! 运行时初始化

use club_config::AppConfig;
use club_errors::{AppError, AppResult};
use club_telemetry::{init_metrics, init_tracing, init_tracing_json};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

/// 运行时配置
pub struct RuntimeConfig {
    pub config_dir: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            config_dir: "config".to_string(),
        }
    }
}

/// 初始化 tracing 与 metrics recorder
pub fn init_runtime(config: &AppConfig) -> AppResult<PrometheusHandle> {
    if config.is_production() {
        init_tracing_json(&config.telemetry.log_level);
    } else {
        init_tracing(&config.telemetry.log_level);
    }

    let metrics = init_metrics()
        .map_err(|e| AppError::internal(format!("Failed to install metrics recorder: {}", e)))?;

    info!(
        app_name = %config.app_name,
        app_env = %config.app_env,
        "Runtime initialized"
    );

    Ok(metrics)
}

//! club-config - 配置加载库
//!
//! 加载顺序：`default.toml` → `{APP_ENV}.toml` → `CLUB_` 前缀的环境变量
//! （嵌套字段使用 `__` 分隔，例如 `CLUB_DATABASE__URL`）。

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Load(Box::new(err))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// 邮件配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: Secret<String>,
    pub from_email: String,
    pub from_name: String,
    #[serde(default)]
    pub use_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// 密码重置配置
#[derive(Debug, Clone, Deserialize)]
pub struct PasswordResetConfig {
    /// 令牌有效期（分钟）
    #[serde(default = "default_token_ttl_minutes")]
    pub token_ttl_minutes: i64,
    /// 单个用户允许同时存在的未使用令牌数
    #[serde(default = "default_max_outstanding_per_user")]
    pub max_outstanding_per_user: u64,
    /// 重置页面地址，令牌以 `?token=` 追加
    pub reset_link_base_url: Url,
}

fn default_token_ttl_minutes() -> i64 {
    30
}

/// 令牌有效期上限（分钟）
pub const MAX_TOKEN_TTL_MINUTES: i64 = 24 * 60;

fn default_max_outstanding_per_user() -> u64 {
    3
}

/// 销售分配策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentPolicy {
    /// 按 1/(1+负载) 加权随机
    #[default]
    Weighted,
    /// 负载最小者，平局取靠前者
    LeastLoaded,
}

/// 销售分配配置
#[derive(Debug, Clone, Deserialize)]
pub struct SellerAssignmentConfig {
    #[serde(default)]
    pub policy: AssignmentPolicy,
    /// 固定随机种子（可复现的分配结果）
    #[serde(default)]
    pub seed: Option<u64>,
    /// 单次回填处理的客户数量上限
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for SellerAssignmentConfig {
    fn default() -> Self {
        Self {
            policy: AssignmentPolicy::default(),
            seed: None,
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> u32 {
    100
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    pub email: EmailConfig,
    pub password_reset: PasswordResetConfig,
    #[serde(default)]
    pub seller_assignment: SellerAssignmentConfig,
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("CLUB_").split("__"));

        Self::from_figment(figment)
    }

    /// 从已组装的 Figment 提取并校验配置
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let ttl = self.password_reset.token_ttl_minutes;
        if ttl <= 0 || ttl > MAX_TOKEN_TTL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "password_reset.token_ttl_minutes must be between 1 and {}, got {}",
                MAX_TOKEN_TTL_MINUTES, ttl
            )));
        }
        if self.password_reset.max_outstanding_per_user == 0 {
            return Err(ConfigError::Invalid(
                "password_reset.max_outstanding_per_user must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }

    /// 是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app_env == "development"
    }
}

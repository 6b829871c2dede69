//! 密码重置令牌实体

use chrono::{DateTime, Duration, Utc};
use club_common::UserId;
use club_errors::{AppError, AppResult};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 密码重置令牌 ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PasswordResetTokenId(pub Uuid);

impl PasswordResetTokenId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for PasswordResetTokenId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PasswordResetTokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 请求来源信息（仅作记录，不参与校验）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestContext {
    pub fn new(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self {
            ip_address,
            user_agent,
        }
    }
}

/// 令牌在某一时刻的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenState {
    /// 未使用且未过期
    Active,
    /// 已使用（终态）
    Consumed,
    /// 已过期（终态，按时钟惰性计算，不落库）
    Expired,
}

/// 密码重置令牌
///
/// 只保存明文令牌的 SHA-256 哈希。`consumed_at` 一旦设置便不会再清空。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetToken {
    pub id: PasswordResetTokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub consumed_at: Option<DateTime<Utc>>,
    pub requester_ip: Option<String>,
    pub user_agent: Option<String>,
}

impl PasswordResetToken {
    /// 创建新的密码重置令牌
    ///
    /// 过期时间为绝对时间 `issued_at + ttl`；有效期必须为正且不能越出时间范围。
    pub fn new(
        user_id: UserId,
        token_hash: String,
        issued_at: DateTime<Utc>,
        ttl: Duration,
        context: &RequestContext,
    ) -> AppResult<Self> {
        if ttl <= Duration::zero() {
            return Err(AppError::internal("Token TTL must be positive"));
        }
        let expires_at = issued_at
            .checked_add_signed(ttl)
            .ok_or_else(|| AppError::internal("Token TTL is out of range"))?;

        Ok(Self {
            id: PasswordResetTokenId::new(),
            user_id,
            token_hash,
            created_at: issued_at,
            expires_at,
            consumed_at: None,
            requester_ip: context.ip_address.clone(),
            user_agent: context.user_agent.clone(),
        })
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_at.is_some()
    }

    /// 到达过期时刻即视为过期
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// 计算令牌状态；已使用优先于已过期
    pub fn state_at(&self, now: DateTime<Utc>) -> TokenState {
        if self.is_consumed() {
            TokenState::Consumed
        } else if self.is_expired_at(now) {
            TokenState::Expired
        } else {
            TokenState::Active
        }
    }

    /// 标记为已使用；已使用过则返回 false 且不修改
    pub fn mark_consumed(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_consumed() {
            return false;
        }
        self.consumed_at = Some(at);
        true
    }
}

/// 签发结果：明文只在此返回一次，用于投递
#[derive(Debug)]
pub struct IssuedToken {
    pub token_id: PasswordResetTokenId,
    pub plaintext: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// 令牌被拒绝的原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// 没有匹配的令牌（含格式错误）
    Invalid,
    /// 已被使用
    Used,
    /// 已过期
    Expired,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Invalid => "invalid",
            Self::Used => "used",
            Self::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 令牌消费结果
///
/// 拒绝是预期内的常见结果，因此作为值返回而不是错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    Consumed { user_id: UserId },
    Rejected(RejectReason),
}

impl ConsumeOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed { .. })
    }

    pub fn user_id(&self) -> Option<UserId> {
        match self {
            Self::Consumed { user_id } => Some(*user_id),
            Self::Rejected(_) => None,
        }
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            Self::Consumed { .. } => None,
            Self::Rejected(reason) => Some(*reason),
        }
    }

    /// 指标标签
    pub fn label(&self) -> &'static str {
        match self {
            Self::Consumed { .. } => "consumed",
            Self::Rejected(reason) => reason.as_str(),
        }
    }
}

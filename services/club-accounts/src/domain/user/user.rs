//! 用户实体

use chrono::{DateTime, Utc};
use club_common::UserId;
use serde::{Deserialize, Serialize};

use super::HashedPassword;

/// 用户角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    Seller,
    Member,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Seller => "seller",
            Self::Member => "member",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "seller" => Some(Self::Seller),
            "member" => Some(Self::Member),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserStatus {
    #[default]
    Active,
    Inactive,
}

impl UserStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(Self::Active),
            "inactive" => Some(Self::Inactive),
            _ => None,
        }
    }
}

impl std::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 用户实体
///
/// 邮箱以小写形式保存，查询时同样按小写匹配。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    pub status: UserStatus,
    pub password_hash: HashedPassword,
    pub last_password_change_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        email: &str,
        display_name: impl Into<String>,
        role: UserRole,
        password_hash: HashedPassword,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: UserId::new(),
            email: normalize_email(email),
            display_name: display_name.into(),
            role,
            status: UserStatus::Active,
            password_hash,
            last_password_change_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    /// 替换密码哈希
    pub fn update_password(&mut self, password_hash: HashedPassword, at: DateTime<Utc>) {
        self.password_hash = password_hash;
        self.last_password_change_at = Some(at);
        self.updated_at = at;
    }

    pub fn deactivate(&mut self, at: DateTime<Utc>) {
        self.status = UserStatus::Inactive;
        self.updated_at = at;
    }
}

/// 邮箱规范化（去空白、转小写）
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn user() -> User {
        User::new(
            "  Alice@Example.COM ",
            "Alice",
            UserRole::Member,
            HashedPassword("$argon2id$old".to_string()),
            Utc::now(),
        )
    }

    #[test]
    fn test_new_user_normalizes_email() {
        let user = user();
        assert_eq!(user.email, "alice@example.com");
        assert!(user.is_active());
        assert!(user.last_password_change_at.is_none());
    }

    #[test]
    fn test_update_password() {
        let mut user = user();
        let at = user.created_at + Duration::minutes(5);
        user.update_password(HashedPassword("$argon2id$new".to_string()), at);

        assert_eq!(user.password_hash.0, "$argon2id$new");
        assert_eq!(user.last_password_change_at, Some(at));
        assert_eq!(user.updated_at, at);
    }

    #[test]
    fn test_role_and_status_parse() {
        for role in [UserRole::Admin, UserRole::Seller, UserRole::Member] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
        assert_eq!(UserStatus::parse("inactive"), Some(UserStatus::Inactive));
        assert_eq!(UserStatus::parse("banned"), None);
    }
}

//! Password 值对象
//!
//! 密码策略：长度 8..=128，小写/大写/数字/符号至少满足三类。

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use club_errors::AppError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MIN_LENGTH: usize = 8;
const MAX_LENGTH: usize = 128;
const MIN_COMPLEXITY_TYPES: usize = 3;

/// 密码错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password must be at least 8 characters")]
    TooShort,

    #[error("Password must be at most 128 characters")]
    TooLong,

    #[error("Password must mix at least 3 of: lowercase, uppercase, digits, symbols")]
    TooSimple,

    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash: {0}")]
    InvalidHash(String),
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::HashingFailed(_) | PasswordError::InvalidHash(_) => {
                AppError::internal(err.to_string())
            }
            _ => AppError::validation(err.to_string()),
        }
    }
}

/// 通过策略校验的明文密码
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(plain: &str) -> Result<Self, PasswordError> {
        let length = plain.chars().count();
        if length < MIN_LENGTH {
            return Err(PasswordError::TooShort);
        }
        if length > MAX_LENGTH {
            return Err(PasswordError::TooLong);
        }

        let classes = [
            plain.chars().any(|c| c.is_lowercase()),
            plain.chars().any(|c| c.is_uppercase()),
            plain.chars().any(|c| c.is_ascii_digit()),
            plain.chars().any(|c| !c.is_alphanumeric()),
        ];
        if classes.iter().filter(|present| **present).count() < MIN_COMPLEXITY_TYPES {
            return Err(PasswordError::TooSimple);
        }

        Ok(Self(plain.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// 使用 Argon2 哈希
    pub fn hash(&self) -> Result<HashedPassword, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(self.0.as_bytes(), &salt)
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
        Ok(HashedPassword(hash.to_string()))
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Password([REDACTED])")
    }
}

/// 哈希后的密码（PHC 字符串）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashedPassword(pub String);

impl HashedPassword {
    /// 验证明文密码是否匹配
    pub fn verify(&self, plain: &str) -> Result<bool, PasswordError> {
        let parsed =
            PasswordHash::new(&self.0).map_err(|e| PasswordError::InvalidHash(e.to_string()))?;

        Ok(Argon2::default()
            .verify_password(plain.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy() {
        assert_eq!(Password::new("Ab1!").unwrap_err(), PasswordError::TooShort);
        assert_eq!(Password::new(&"aB3".repeat(50)).unwrap_err(), PasswordError::TooLong);
        assert_eq!(Password::new("lowercaseonly").unwrap_err(), PasswordError::TooSimple);
        assert!(Password::new("Voyage2026").is_ok());
        assert!(Password::new("voyage-2026").is_ok());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = Password::new("Voyage2026!").unwrap();
        let hashed = password.hash().unwrap();

        assert!(hashed.0.starts_with("$argon2"));
        assert!(hashed.verify("Voyage2026!").unwrap());
        assert!(!hashed.verify("Voyage2027!").unwrap());
    }

    #[test]
    fn test_invalid_hash() {
        let hashed = HashedPassword("not-a-phc-string".to_string());
        assert!(matches!(
            hashed.verify("whatever"),
            Err(PasswordError::InvalidHash(_))
        ));
    }

    #[test]
    fn test_debug_is_redacted() {
        let password = Password::new("Voyage2026!").unwrap();
        assert!(!format!("{:?}", password).contains("Voyage"));
    }

    #[test]
    fn test_maps_to_app_error() {
        let err: AppError = PasswordError::TooShort.into();
        assert!(matches!(err, AppError::Validation(_)));
    }
}

//! 一次性令牌明文的生成与哈希
//!
//! 明文为 32 字节操作系统随机数的十六进制编码（64 个字符），
//! 落库的只有其 SHA-256 摘要。此处哈希与用户密码的 argon2 哈希相互独立。

use rand::RngCore;
use rand::rngs::OsRng;
use secrecy::{Secret, SecretString};
use sha2::{Digest, Sha256};

/// 随机字节数（256 bit）
pub const SECRET_BYTES: usize = 32;

/// 明文长度（十六进制字符）
pub const SECRET_HEX_LEN: usize = SECRET_BYTES * 2;

/// 生成新的一次性明文令牌
pub fn generate() -> SecretString {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng.fill_bytes(&mut bytes);
    Secret::new(hex::encode(bytes))
}

/// 计算明文的 SHA-256 十六进制摘要
pub fn hash(plaintext: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plaintext.as_bytes());
    hex::encode(hasher.finalize())
}

/// 是否可能是本服务签发的明文（小写十六进制、固定长度）
pub fn is_well_formed(plaintext: &str) -> bool {
    plaintext.len() == SECRET_HEX_LEN
        && plaintext
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn test_generate_is_well_formed_and_unique() {
        let a = generate();
        let b = generate();

        assert_eq!(a.expose_secret().len(), SECRET_HEX_LEN);
        assert!(is_well_formed(a.expose_secret()));
        assert_ne!(a.expose_secret(), b.expose_secret());
    }

    #[test]
    fn test_hash_is_deterministic_and_one_way() {
        let plaintext = generate();
        let digest = hash(plaintext.expose_secret());

        assert_eq!(digest, hash(plaintext.expose_secret()));
        assert_eq!(digest.len(), 64);
        assert_ne!(&digest, plaintext.expose_secret());
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            hash("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("not-a-token"));
        assert!(!is_well_formed(&"A".repeat(SECRET_HEX_LEN)));
        assert!(!is_well_formed(&"a".repeat(SECRET_HEX_LEN + 1)));
        assert!(is_well_formed(&"0f".repeat(SECRET_BYTES)));
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let plaintext = generate();
        assert!(!format!("{:?}", plaintext).contains(plaintext.expose_secret().as_str()));
    }
}

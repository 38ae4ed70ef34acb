//! Password strength policy and salted hashing.
//!
//! Stored form: `hex(SHA-256(salt || password))` alongside the salt. The salt
//! is per-user and generated at registration and on every password change.

use ff_config::PasswordPolicyConfig;
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordError {
    #[error("password must be at least {0} characters long")]
    TooShort(usize),
    #[error("password must contain an uppercase letter")]
    MissingUpper,
    #[error("password must contain a lowercase letter")]
    MissingLower,
    #[error("password must contain a digit")]
    MissingDigit,
    #[error("password must contain a symbol")]
    MissingSymbol,
    #[error("password must not contain whitespace")]
    Whitespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_upper: bool,
    pub require_lower: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self::from(&PasswordPolicyConfig::default())
    }
}

impl From<&PasswordPolicyConfig> for PasswordPolicy {
    fn from(c: &PasswordPolicyConfig) -> Self {
        Self {
            min_length: c.min_length,
            require_upper: c.require_upper,
            require_lower: c.require_lower,
            require_digit: c.require_digit,
            require_symbol: c.require_symbol,
        }
    }
}

impl PasswordPolicy {
    /// Returns the first unmet rule.
    pub fn check(&self, password: &str) -> Result<(), PasswordError> {
        if password.chars().count() < self.min_length {
            return Err(PasswordError::TooShort(self.min_length));
        }
        if password.chars().any(char::is_whitespace) {
            return Err(PasswordError::Whitespace);
        }
        if self.require_upper && !password.chars().any(|c| c.is_uppercase()) {
            return Err(PasswordError::MissingUpper);
        }
        if self.require_lower && !password.chars().any(|c| c.is_lowercase()) {
            return Err(PasswordError::MissingLower);
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return Err(PasswordError::MissingDigit);
        }
        if self.require_symbol && password.chars().all(|c| c.is_alphanumeric()) {
            return Err(PasswordError::MissingSymbol);
        }
        Ok(())
    }
}

/// 32 lowercase hex chars.
pub fn generate_salt() -> String {
    Uuid::new_v4().simple().to_string()
}

pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

pub fn verify_password(password: &str, salt: &str, expected_hash: &str) -> bool {
    let actual = hash_password(password, salt);
    constant_time_eq(actual.as_bytes(), expected_hash.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_rules() {
        let p = PasswordPolicy::default();
        assert_eq!(p.check("Sh0rt"), Err(PasswordError::TooShort(8)));
        assert_eq!(p.check("alllower1"), Err(PasswordError::MissingUpper));
        assert_eq!(p.check("ALLUPPER1"), Err(PasswordError::MissingLower));
        assert_eq!(p.check("NoDigitsHere"), Err(PasswordError::MissingDigit));
        assert_eq!(p.check("Has Space1"), Err(PasswordError::Whitespace));
        assert!(p.check("Tartiflette35").is_ok());
    }

    #[test]
    fn symbol_rule_when_enabled() {
        let p = PasswordPolicy {
            require_symbol: true,
            ..PasswordPolicy::default()
        };
        assert_eq!(p.check("Tartiflette35"), Err(PasswordError::MissingSymbol));
        assert!(p.check("Tartiflette35!").is_ok());
    }

    #[test]
    fn salt_is_random_hex() {
        let a = generate_salt();
        let b = generate_salt();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }

    #[test]
    fn hash_depends_on_salt() {
        let h1 = hash_password("Tartiflette35", "salt-a");
        let h2 = hash_password("Tartiflette35", "salt-b");
        assert_ne!(h1, h2);
        assert_eq!(h1.len(), 64);
        assert_eq!(h1, hash_password("Tartiflette35", "salt-a"));
    }

    #[test]
    fn verify_roundtrip() {
        let salt = generate_salt();
        let h = hash_password("Tartiflette35", &salt);
        assert!(verify_password("Tartiflette35", &salt, &h));
        assert!(!verify_password("tartiflette35", &salt, &h));
        assert!(!verify_password("Tartiflette35", &salt, "deadbeef"));
    }
}

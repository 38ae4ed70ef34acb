use chrono::{DateTime, Utc};
use ff_config::AuthConfig;
use ff_schemas::{Role, User};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// JWT payload carried by every bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: Uuid,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token: {0}")]
    Invalid(String),
    #[error("token issuer misconfigured: {0}")]
    Config(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            _ => TokenError::Invalid(e.to_string()),
        }
    }
}

/// Issues and verifies HS256 tokens for one signing key.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("issuer", &self.issuer)
            .field("ttl_seconds", &self.ttl_seconds)
            .finish_non_exhaustive()
    }
}

impl TokenIssuer {
    pub fn new(secret: &str, issuer: &str, ttl_seconds: i64) -> Result<Self, TokenError> {
        if secret.is_empty() {
            return Err(TokenError::Config("empty signing key".to_string()));
        }
        if ttl_seconds <= 0 {
            return Err(TokenError::Config(format!(
                "ttl must be > 0, got {ttl_seconds}"
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer: issuer.to_string(),
            ttl_seconds,
        })
    }

    pub fn from_config(secret: &str, cfg: &AuthConfig) -> Result<Self, TokenError> {
        Self::new(secret, &cfg.issuer, cfg.token_ttl_seconds)
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    pub fn issue(&self, user: &User) -> Result<String, TokenError> {
        self.issue_at(user, Utc::now())
    }

    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.user_id,
            username: user.username.clone(),
            role: user.role,
            iat,
            exp: iat + self.ttl_seconds,
            iss: self.issuer.clone(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// Checks signature, expiry and issuer.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(header_value: &str) -> Option<&str> {
    let (scheme, rest) = header_value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const KEY: &str = "0123456789abcdef0123456789abcdef";

    fn alice() -> User {
        User {
            user_id: Uuid::new_v4(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Martin".to_string(),
            email: "alice@example.com".to_string(),
            role: Role::Customer,
            created_at_utc: Utc::now(),
        }
    }

    #[test]
    fn issue_then_verify() {
        let issuer = TokenIssuer::new(KEY, "foodfleet", 3600).unwrap();
        let user = alice();
        let token = issuer.issue(&user).unwrap();
        let claims = issuer.verify(&token).unwrap();
        assert_eq!(claims.sub, user.user_id);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, Role::Customer);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert_eq!(claims.iss, "foodfleet");
    }

    #[test]
    fn expired_token_is_rejected() {
        let issuer = TokenIssuer::new(KEY, "foodfleet", 60).unwrap();
        let token = issuer
            .issue_at(&alice(), Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(matches!(issuer.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let a = TokenIssuer::new(KEY, "foodfleet", 3600).unwrap();
        let b = TokenIssuer::new("fedcba9876543210fedcba9876543210", "foodfleet", 3600).unwrap();
        let token = a.issue(&alice()).unwrap();
        assert!(matches!(b.verify(&token), Err(TokenError::Invalid(_))));
    }

    #[test]
    fn wrong_issuer_is_rejected() {
        let a = TokenIssuer::new(KEY, "foodfleet", 3600).unwrap();
        let b = TokenIssuer::new(KEY, "someone-else", 3600).unwrap();
        let token = a.issue(&alice()).unwrap();
        assert!(b.verify(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let issuer = TokenIssuer::new(KEY, "foodfleet", 3600).unwrap();
        assert!(matches!(
            issuer.verify("not.a.jwt"),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn bad_construction() {
        assert!(TokenIssuer::new("", "x", 10).is_err());
        assert!(TokenIssuer::new(KEY, "x", 0).is_err());
    }

    #[test]
    fn bearer_header_parsing() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}

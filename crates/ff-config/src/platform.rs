//! Typed view of the merged config.
//!
//! Every section has serde defaults so an empty config is a valid dev setup.
//! Secrets are referenced by env var NAME only (see [`crate::secrets`]).

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub password_policy: PasswordPolicyConfig,
    pub restaurant: RestaurantConfig,
    pub maps: MapsConfig,
    pub orders: OrdersConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the REST daemon. `FF_DAEMON_ADDR` overrides it.
    pub addr: String,
    /// Browser origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:8080".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// NAME of the env var carrying the HS256 signing key.
    pub jwt_secret_env: String,
    pub token_ttl_seconds: i64,
    pub issuer: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret_env: "FF_JWT_SECRET".to_string(),
            token_ttl_seconds: 3600,
            issuer: "foodfleet".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordPolicyConfig {
    pub min_length: usize,
    pub require_upper: bool,
    pub require_lower: bool,
    pub require_digit: bool,
    pub require_symbol: bool,
}

impl Default for PasswordPolicyConfig {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_upper: true,
            require_lower: true,
            require_digit: true,
            require_symbol: false,
        }
    }
}

/// Where every delivery starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RestaurantConfig {
    pub name: String,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Default for RestaurantConfig {
    fn default() -> Self {
        Self {
            name: "FoodFleet Kitchen".to_string(),
            street: "51 Rue Blaise Pascal".to_string(),
            postal_code: "35170".to_string(),
            city: "Bruz".to_string(),
        }
    }
}

impl RestaurantConfig {
    pub fn one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapsConfig {
    pub base_url: String,
    /// NAME of the env var carrying the maps API key.
    pub api_key_env: String,
    pub language: String,
    pub timeout_seconds: u64,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key_env: "FF_MAPS_API_KEY".to_string(),
            language: "en".to_string(),
            timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrdersConfig {
    /// Upper bound on the total item count of a single order.
    pub max_items_per_order: i32,
}

impl Default for OrdersConfig {
    fn default() -> Self {
        Self {
            max_items_per_order: 50,
        }
    }
}

impl PlatformConfig {
    /// Decode and validate the merged config JSON.
    pub fn from_json(config_json: &Value) -> Result<Self> {
        let cfg: PlatformConfig = serde_json::from_value(config_json.clone())
            .context("config does not match the platform schema")?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.auth.token_ttl_seconds <= 0 {
            bail!("CONFIG_INVALID auth.token_ttl_seconds must be > 0");
        }
        if self.auth.jwt_secret_env.trim().is_empty() {
            bail!("CONFIG_INVALID auth.jwt_secret_env must name an env var");
        }
        if self.password_policy.min_length == 0 {
            bail!("CONFIG_INVALID password_policy.min_length must be >= 1");
        }
        if self.orders.max_items_per_order <= 0 {
            bail!("CONFIG_INVALID orders.max_items_per_order must be > 0");
        }
        if self.maps.timeout_seconds == 0 {
            bail!("CONFIG_INVALID maps.timeout_seconds must be > 0");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_yields_defaults() {
        let cfg = PlatformConfig::from_json(&serde_json::json!({})).unwrap();
        assert_eq!(cfg, PlatformConfig::default());
        assert_eq!(cfg.auth.token_ttl_seconds, 3600);
        assert_eq!(cfg.restaurant.one_line(), "51 Rue Blaise Pascal, 35170 Bruz");
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let cfg = PlatformConfig::from_json(&serde_json::json!({
            "auth": { "token_ttl_seconds": 600 }
        }))
        .unwrap();
        assert_eq!(cfg.auth.token_ttl_seconds, 600);
        assert_eq!(cfg.auth.issuer, "foodfleet");
        assert_eq!(cfg.password_policy.min_length, 8);
    }

    #[test]
    fn invalid_ttl_is_rejected() {
        let err = PlatformConfig::from_json(&serde_json::json!({
            "auth": { "token_ttl_seconds": 0 }
        }))
        .unwrap_err();
        assert!(err.to_string().contains("token_ttl_seconds"));
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(PlatformConfig::from_json(&serde_json::json!({
            "orders": { "max_items_per_order": "many" }
        }))
        .is_err());
    }
}

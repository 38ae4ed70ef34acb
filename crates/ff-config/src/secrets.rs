//! Runtime secret resolution.
//!
//! # Contract
//! - Config YAML stores only **env var NAMES** (e.g. `"FF_JWT_SECRET"`).
//! - At startup, callers invoke [`resolve_secrets`] once and pass the result
//!   into constructors; `std::env::var` is not scattered across the codebase.
//! - `Debug` on [`ResolvedSecrets`] redacts values.
//! - Error messages reference the env var **NAME**, never the value.
//!
//! # Surface-aware enforcement
//! | Surface       | Required          |
//! |---------------|-------------------|
//! | DAEMON        | JWT signing key   |
//! | CLI           | JWT signing key   |
//! | MAINTENANCE   | nothing           |
//!
//! The maps API key is always optional here; the delivery itinerary call
//! fails on its own when it is absent.

use anyhow::{bail, Result};
use serde_json::Value;

use crate::ConfigSurface;

/// HS256 keys shorter than this are refused.
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Clone)]
pub struct ResolvedSecrets {
    /// HS256 signing key. `None` if the named env var was absent or empty.
    pub jwt_secret: Option<String>,
    /// Maps API key. `None` if the named env var was absent or empty.
    pub maps_api_key: Option<String>,
}

impl std::fmt::Debug for ResolvedSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedSecrets")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<REDACTED>"))
            .field(
                "maps_api_key",
                &self.maps_api_key.as_ref().map(|_| "<REDACTED>"),
            )
            .finish()
    }
}

/// Env var names extracted from the config JSON.
struct SecretEnvNames {
    jwt_secret_var: String,
    maps_api_key_var: String,
}

/// Read a non-empty string value at `pointer`.
fn read_str_at(config: &Value, pointer: &str) -> Option<String> {
    let s = config.pointer(pointer)?.as_str()?;
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Returns `None` if the variable is unset or blank.
fn resolve_env(var_name: &str) -> Option<String> {
    match std::env::var(var_name) {
        Ok(v) if !v.trim().is_empty() => Some(v),
        _ => None,
    }
}

fn parse_env_names(config_json: &Value) -> SecretEnvNames {
    SecretEnvNames {
        jwt_secret_var: read_str_at(config_json, "/auth/jwt_secret_env")
            .unwrap_or_else(|| "FF_JWT_SECRET".to_string()),
        maps_api_key_var: read_str_at(config_json, "/maps/api_key_env")
            .unwrap_or_else(|| "FF_MAPS_API_KEY".to_string()),
    }
}

/// Resolve all secrets from the environment for the given surface.
///
/// # Errors
/// `SECRETS_MISSING` with the env var NAME when a required secret is absent;
/// `SECRETS_WEAK` when the JWT key is shorter than [`MIN_JWT_SECRET_LEN`].
pub fn resolve_secrets(config_json: &Value, surface: ConfigSurface) -> Result<ResolvedSecrets> {
    let names = parse_env_names(config_json);

    let jwt_secret = resolve_env(&names.jwt_secret_var);
    let maps_api_key = resolve_env(&names.maps_api_key_var);

    match surface {
        ConfigSurface::Daemon | ConfigSurface::Cli => match &jwt_secret {
            None => bail!(
                "SECRETS_MISSING surface={}: required env var '{}' \
                 (JWT signing key) is not set or empty",
                surface.as_str(),
                names.jwt_secret_var,
            ),
            Some(s) if s.len() < MIN_JWT_SECRET_LEN => bail!(
                "SECRETS_WEAK surface={}: env var '{}' (JWT signing key) \
                 must be at least {} bytes",
                surface.as_str(),
                names.jwt_secret_var,
                MIN_JWT_SECRET_LEN,
            ),
            Some(_) => {}
        },
        ConfigSurface::Maintenance => {}
    }

    Ok(ResolvedSecrets {
        jwt_secret,
        maps_api_key,
    })
}

//! Service layer.
//!
//! [`Platform`] owns the pool, the typed config, the token issuer and the
//! route provider. Every public operation checks the caller's role, validates
//! input, then delegates to `ff-db`. Front-ends (daemon, CLI) only translate
//! transport to these calls and [`ServiceError`] back to their own surface.

use std::sync::Arc;

use anyhow::Context;
use ff_auth::{Claims, PasswordPolicy, TokenIssuer};
use ff_config::{secrets::ResolvedSecrets, PlatformConfig};
use ff_routing::{
    DirectionsRequest, GeocodedAddress, GoogleMapsProvider, Itinerary, RouteProvider,
    RoutingError,
};
use ff_schemas::Role;
use sqlx::PgPool;
use uuid::Uuid;

mod accounts;
mod catalogue;
mod delivery;
mod error;
mod ordering;
pub mod validate;

pub use accounts::{NewUserRequest, ProfileUpdate, RegisterRequest};
pub use catalogue::{ProductInput, ProductUpdate};
pub use delivery::DeliveryPlan;
pub use error::{ServiceError, ServiceResult};
pub use ordering::PlaceOrderRequest;

/// Authenticated caller, derived from verified token claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Actor {
    fn from(c: Claims) -> Self {
        Self {
            user_id: c.sub,
            username: c.username,
            role: c.role,
        }
    }
}

impl Actor {
    pub(crate) fn require(&self, role: Role) -> ServiceResult<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(ServiceError::forbidden(format!(
                "{} role required",
                role.as_str().to_lowercase()
            )))
        }
    }
}

pub struct Platform {
    pool: PgPool,
    config: PlatformConfig,
    policy: PasswordPolicy,
    tokens: TokenIssuer,
    routes: Arc<dyn RouteProvider>,
}

impl Platform {
    pub fn new(
        pool: PgPool,
        config: PlatformConfig,
        tokens: TokenIssuer,
        routes: Arc<dyn RouteProvider>,
    ) -> Self {
        let policy = PasswordPolicy::from(&config.password_policy);
        Self {
            pool,
            config,
            policy,
            tokens,
            routes,
        }
    }

    /// Wire a platform from resolved secrets. Without a maps key the
    /// itinerary operation reports an upstream error; everything else works.
    pub fn from_secrets(
        pool: PgPool,
        config: PlatformConfig,
        secrets: &ResolvedSecrets,
    ) -> anyhow::Result<Self> {
        let jwt_secret = secrets
            .jwt_secret
            .as_deref()
            .with_context(|| format!("SECRETS_MISSING {}", config.auth.jwt_secret_env))?;
        let tokens = TokenIssuer::from_config(jwt_secret, &config.auth)
            .context("token issuer setup failed")?;

        let routes: Arc<dyn RouteProvider> = match secrets.maps_api_key.as_deref() {
            Some(key) => Arc::new(
                GoogleMapsProvider::from_config(key.to_string(), &config.maps)
                    .context("maps client setup failed")?,
            ),
            None => {
                tracing::warn!(
                    env = %config.maps.api_key_env,
                    "maps api key not set; delivery itineraries are disabled"
                );
                Arc::new(RoutingDisabled {
                    env_var: config.maps.api_key_env.clone(),
                })
            }
        };

        Ok(Self::new(pool, config, tokens, routes))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.tokens.ttl_seconds()
    }
}

/// Stand-in provider used when no maps key is configured.
struct RoutingDisabled {
    env_var: String,
}

#[async_trait::async_trait]
impl RouteProvider for RoutingDisabled {
    fn source_name(&self) -> &'static str {
        "disabled"
    }

    async fn directions(&self, _req: &DirectionsRequest) -> Result<Itinerary, RoutingError> {
        Err(RoutingError::Config(format!("{} is not set", self.env_var)))
    }

    async fn geocode(&self, _address: &str) -> Result<GeocodedAddress, RoutingError> {
        Err(RoutingError::Config(format!("{} is not set", self.env_var)))
    }
}

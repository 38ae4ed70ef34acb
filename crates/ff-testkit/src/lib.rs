//! Fixtures shared by the DB-backed scenario tests of `ff-service`,
//! `ff-daemon` and `ff-cli`. Never a production dependency.

use std::sync::Mutex;

use anyhow::Result;
use ff_auth::{generate_salt, hash_password};
use ff_db::{NewProduct, NewUser};
use ff_routing::{
    DirectionsRequest, GeocodedAddress, Itinerary, LatLng, Leg, RouteProvider, RoutingError, Step,
};
use ff_schemas::{AddressInput, Product, Role, User, Vehicle};
use sqlx::PgPool;
use uuid::Uuid;

/// HS256 key for tests. Long enough for any sane minimum.
pub const TEST_JWT_SECRET: &str = "ff-testkit-signing-key-0123456789abcdef";

/// Password every seeded account is created with. Satisfies the default policy.
pub const TEST_PASSWORD: &str = "Fleet2024pw";

/// Connect and migrate, or print a SKIP line and return `None` when
/// `FF_DATABASE_URL` is not set.
pub async fn db_or_skip() -> Result<Option<PgPool>> {
    let url = match std::env::var(ff_db::ENV_DB_URL) {
        Ok(v) => v,
        Err(_) => {
            eprintln!("SKIP: FF_DATABASE_URL not set");
            return Ok(None);
        }
    };
    let pool = ff_db::connect(&url).await?;
    ff_db::migrate(&pool).await?;
    Ok(Some(pool))
}

/// Username that will not collide across test runs sharing one database.
pub fn unique_username(prefix: &str) -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &id[..12])
}

/// Insert an account of `role` whose password is [`TEST_PASSWORD`].
pub async fn seed_user(pool: &PgPool, role: Role) -> Result<User> {
    let salt = generate_salt();
    let user = ff_db::insert_user(
        pool,
        &NewUser {
            user_id: Uuid::new_v4(),
            username: unique_username(&role.as_str().to_lowercase()),
            first_name: "Test".to_string(),
            last_name: role.as_str().to_string(),
            email: "test@example.com".to_string(),
            role,
            password_hash: hash_password(TEST_PASSWORD, &salt),
            salt,
            vehicle: (role == Role::Driver).then_some(Vehicle::Bike),
        },
    )
    .await?;
    Ok(user)
}

pub async fn seed_product(pool: &PgPool, price_cents: i64, stock: i32) -> Result<Product> {
    let product = ff_db::insert_product(
        pool,
        &NewProduct {
            name: format!("Galette {}", &Uuid::new_v4().simple().to_string()[..6]),
            description: "buckwheat, ham, egg".to_string(),
            product_type: "main".to_string(),
            price_cents,
            stock,
            is_available: true,
        },
    )
    .await?;
    Ok(product)
}

pub fn sample_address() -> AddressInput {
    AddressInput {
        street: "2 Place de la Mairie".to_string(),
        postal_code: "35000".to_string(),
        city: "Rennes".to_string(),
    }
}

/// Route provider answering every request with the same one-leg itinerary.
/// Records the directions requests it served.
#[derive(Debug, Default)]
pub struct FixedRouteProvider {
    seen: Mutex<Vec<DirectionsRequest>>,
}

impl FixedRouteProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<DirectionsRequest> {
        self.seen.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl RouteProvider for FixedRouteProvider {
    fn source_name(&self) -> &'static str {
        "fixed"
    }

    async fn directions(&self, req: &DirectionsRequest) -> Result<Itinerary, RoutingError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(req.clone());
        }
        Ok(Itinerary {
            legs: vec![Leg {
                start_address: req.origin.clone(),
                end_address: req.destination.clone(),
                distance_m: 12_400,
                duration_s: 1_080,
                steps: vec![
                    Step {
                        instruction: "Head north".to_string(),
                        distance_m: 400,
                        duration_s: 60,
                    },
                    Step {
                        instruction: "Continue to destination".to_string(),
                        distance_m: 12_000,
                        duration_s: 1_020,
                    },
                ],
            }],
        })
    }

    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, RoutingError> {
        Ok(GeocodedAddress {
            formatted_address: format!("{address}, France"),
            location: LatLng {
                lat: 48.1113,
                lng: -1.6800,
            },
        })
    }
}

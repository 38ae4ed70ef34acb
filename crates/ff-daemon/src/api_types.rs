//! Request and response bodies for the ff-daemon HTTP endpoints that are not
//! plain domain types. Domain objects (`User`, `Product`, `Order`) and the
//! service request types are serialized as-is.

use ff_schemas::{User, Vehicle};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

/// Body of every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    /// Stable machine-readable name, e.g. `INSUFFICIENT_STOCK`.
    pub code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestockRequest {
    pub delta: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRemovedResponse {
    pub product_id: Uuid,
    /// "DELETED" | "RETIRED"
    pub outcome: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleBody {
    pub vehicle: Vehicle,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoveItemQuery {
    /// Units to give back; defaults to 1.
    pub quantity: Option<i32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserListQuery {
    pub role: Option<String>,
}

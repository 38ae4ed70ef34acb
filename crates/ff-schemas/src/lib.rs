//! ff-schemas
//!
//! Domain and wire types shared by the DB layer, the service layer, the REST
//! daemon and the CLI. No I/O and no business rules live here; the order
//! lifecycle rules are in `ff-orders`.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// Actor kind. Every user row carries exactly one role, mirrored by a row in
/// the matching role table (`admins`, `customers`, `drivers`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
    Driver,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
            Role::Driver => "DRIVER",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "CUSTOMER" => Ok(Role::Customer),
            "DRIVER" => Ok(Role::Driver),
            other => Err(anyhow!(
                "invalid role '{}'. expected one of: ADMIN | CUSTOMER | DRIVER",
                other
            )),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderStatus
// ---------------------------------------------------------------------------

/// Order lifecycle status.
///
/// ```text
/// Preparing ──► Ready ──► OnTheWay ──► Delivered
///     │           │
///     └───────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Preparing,
    Ready,
    OnTheWay,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::OnTheWay,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ];

    /// Code stored in the `orders.status` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::Ready => "READY",
            OrderStatus::OnTheWay => "ON_THE_WAY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Human label shown by the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Preparing => "Preparing",
            OrderStatus::Ready => "Ready",
            OrderStatus::OnTheWay => "On the way",
            OrderStatus::Delivered => "Delivered",
            OrderStatus::Cancelled => "Cancelled",
        }
    }

    /// Accepts the DB code or the human label, case-insensitively.
    pub fn parse(s: &str) -> Result<Self> {
        let norm = s.trim().to_ascii_uppercase().replace([' ', '-'], "_");
        match norm.as_str() {
            "PREPARING" => Ok(OrderStatus::Preparing),
            "READY" => Ok(OrderStatus::Ready),
            "ON_THE_WAY" | "ONTHEWAY" => Ok(OrderStatus::OnTheWay),
            "DELIVERED" => Ok(OrderStatus::Delivered),
            "CANCELLED" | "CANCELED" => Ok(OrderStatus::Cancelled),
            _ => Err(anyhow!("invalid order status: {}", s)),
        }
    }

    /// No further transitions are possible.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// Vehicle
// ---------------------------------------------------------------------------

/// A driver's means of transport. Drives the travel mode requested from the
/// mapping provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Vehicle {
    Car,
    Bike,
    Foot,
}

impl Vehicle {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vehicle::Car => "CAR",
            Vehicle::Bike => "BIKE",
            Vehicle::Foot => "FOOT",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CAR" => Ok(Vehicle::Car),
            "BIKE" | "BICYCLE" => Ok(Vehicle::Bike),
            "FOOT" | "WALK" => Ok(Vehicle::Foot),
            other => Err(anyhow!(
                "invalid vehicle '{}'. expected one of: CAR | BIKE | FOOT",
                other
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Public view of a user account. Password hash and salt never leave the DB layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub role: Role,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub product_id: Uuid,
    pub name: String,
    pub description: String,
    /// Free-form category ("main", "drink", "dessert", ...).
    pub product_type: String,
    pub price_cents: i64,
    pub stock: i32,
    pub is_available: bool,
    pub created_at_utc: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub address_id: Uuid,
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

impl Address {
    /// Single-line form used for geocoding and directions queries.
    pub fn one_line(&self) -> String {
        format!("{}, {} {}", self.street, self.postal_code, self.city)
    }
}

/// Delivery address as supplied by a customer, before it has an id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub street: String,
    pub postal_code: String,
    pub city: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    /// Price captured when the line was first added; later catalogue price
    /// changes do not affect existing orders.
    pub unit_price_cents: i64,
    pub line_total_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub customer_id: Uuid,
    pub driver_id: Option<Uuid>,
    pub address: Address,
    pub status: OrderStatus,
    pub nb_items: i32,
    pub total_cents: i64,
    pub created_at_utc: DateTime<Utc>,
    pub updated_at_utc: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// One requested line when placing or extending an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Render integer cents as a decimal amount ("12.34", "-0.05").
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Parse a decimal amount ("12", "12.3", "12.34") into integer cents.
/// More than two fractional digits is rejected rather than rounded.
pub fn parse_cents(s: &str) -> Result<i64> {
    let t = s.trim();
    let (neg, body) = match t.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, t),
    };
    let (whole, frac) = match body.split_once('.') {
        Some((w, f)) => (w, f),
        None => (body, ""),
    };
    if whole.is_empty() || !whole.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("invalid amount: {}", s));
    }
    if frac.len() > 2 || !frac.chars().all(|c| c.is_ascii_digit()) {
        return Err(anyhow!("invalid amount (max 2 decimals): {}", s));
    }
    let whole: i64 = whole
        .parse()
        .map_err(|_| anyhow!("amount out of range: {}", s))?;
    let frac_cents: i64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<i64>().unwrap_or(0) * 10,
        _ => frac.parse::<i64>().unwrap_or(0),
    };
    let cents = whole
        .checked_mul(100)
        .and_then(|w| w.checked_add(frac_cents))
        .ok_or_else(|| anyhow!("amount out of range: {}", s))?;
    Ok(if neg { -cents } else { cents })
}

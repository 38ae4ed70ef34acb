//! Delivery routing.
//!
//! The provider boundary is [`RouteProvider`]; the only concrete provider is
//! the Google Maps web-service client in [`google`]. Formatting helpers turn an
//! [`Itinerary`] into driver-facing text and a shareable directions link.

use ff_schemas::Vehicle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

mod format;
pub mod google;

pub use format::{directions_url, format_distance, format_duration, format_itinerary, strip_html};
pub use google::GoogleMapsProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    Driving,
    Bicycling,
    Walking,
}

impl TravelMode {
    /// Value of the `mode` / `travelmode` query parameter.
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Walking => "walking",
        }
    }
}

impl From<Vehicle> for TravelMode {
    fn from(v: Vehicle) -> Self {
        match v {
            Vehicle::Car => TravelMode::Driving,
            Vehicle::Bike => TravelMode::Bicycling,
            Vehicle::Foot => TravelMode::Walking,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeocodedAddress {
    pub formatted_address: String,
    pub location: LatLng,
}

/// One instruction. `instruction` is plain text (HTML already stripped).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub instruction: String,
    pub distance_m: u64,
    pub duration_s: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Leg {
    pub start_address: String,
    pub end_address: String,
    pub distance_m: u64,
    pub duration_s: u64,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Itinerary {
    pub legs: Vec<Leg>,
}

impl Itinerary {
    pub fn total_distance_m(&self) -> u64 {
        self.legs.iter().map(|l| l.distance_m).sum()
    }

    pub fn total_duration_s(&self) -> u64 {
        self.legs.iter().map(|l| l.duration_s).sum()
    }
}

/// Addresses are free text; the provider resolves them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub origin: String,
    pub destination: String,
    /// Intermediate stops, in visiting order.
    pub waypoints: Vec<String>,
    pub mode: TravelMode,
}

#[derive(Debug, Error)]
pub enum RoutingError {
    #[error("transport error: {0}")]
    Transport(String),

    /// The upstream answered with a non-OK status string or HTTP status.
    #[error("routing api error status={status}: {message}")]
    Api { status: String, message: String },

    #[error("no route or location found for {0}")]
    NotFound(String),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("config error: {0}")]
    Config(String),
}

/// Upstream directions / geocoding contract.
#[async_trait::async_trait]
pub trait RouteProvider: Send + Sync {
    fn source_name(&self) -> &'static str;

    async fn directions(&self, req: &DirectionsRequest) -> Result<Itinerary, RoutingError>;

    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, RoutingError>;
}

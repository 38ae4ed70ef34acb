//! Google Maps Directions + Geocoding web-service client.
//!
//! The API key is resolved by the caller and passed in; it is never logged.

use std::time::Duration;

use ff_config::MapsConfig;
use serde::Deserialize;

use crate::{
    strip_html, DirectionsRequest, GeocodedAddress, Itinerary, LatLng, Leg, RouteProvider,
    RoutingError, Step,
};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

#[derive(Clone)]
pub struct GoogleMapsProvider {
    api_key: String,
    http: reqwest::Client,
    base_url: String,
    language: String,
}

impl std::fmt::Debug for GoogleMapsProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsProvider")
            .field("base_url", &self.base_url)
            .field("language", &self.language)
            .field("api_key", &"<REDACTED>")
            .finish()
    }
}

impl GoogleMapsProvider {
    pub fn new(api_key: String) -> Self {
        Self::new_with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn new_with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            api_key,
            http: reqwest::Client::new(),
            base_url,
            language: "en".to_string(),
        }
    }

    /// Base URL, language and request timeout come from the `maps` section.
    pub fn from_config(api_key: String, cfg: &MapsConfig) -> Result<Self, RoutingError> {
        if api_key.trim().is_empty() {
            return Err(RoutingError::Config(format!(
                "maps api key env var '{}' is empty",
                cfg.api_key_env
            )));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .map_err(|e| RoutingError::Config(e.to_string()))?;
        Ok(Self {
            api_key,
            http,
            base_url: cfg.base_url.clone(),
            language: cfg.language.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn get_json<T>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, RoutingError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let mut params: Vec<(&str, &str)> = query.to_vec();
        params.push(("language", self.language.as_str()));
        params.push(("key", self.api_key.as_str()));

        let resp = self
            .http
            .get(self.endpoint(path))
            .query(&params)
            .send()
            .await
            .map_err(|e| RoutingError::Transport(e.without_url().to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RoutingError::Api {
                status: format!("HTTP_{}", status.as_u16()),
                message: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| RoutingError::Decode(e.without_url().to_string()))
    }
}

/// Map a non-OK status string to an error. `ZERO_RESULTS` / `NOT_FOUND`
/// mean the query was valid but had no answer.
fn check_status(
    status: &str,
    error_message: Option<&str>,
    subject: &str,
) -> Result<(), RoutingError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" | "NOT_FOUND" => Err(RoutingError::NotFound(subject.to_string())),
        other => Err(RoutingError::Api {
            status: other.to_string(),
            message: error_message.unwrap_or("no error message").to_string(),
        }),
    }
}

#[async_trait::async_trait]
impl RouteProvider for GoogleMapsProvider {
    fn source_name(&self) -> &'static str {
        "google_maps"
    }

    async fn directions(&self, req: &DirectionsRequest) -> Result<Itinerary, RoutingError> {
        let waypoints = req.waypoints.join("|");
        let mut query: Vec<(&str, &str)> = vec![
            ("origin", req.origin.as_str()),
            ("destination", req.destination.as_str()),
            ("mode", req.mode.as_str()),
        ];
        if !waypoints.is_empty() {
            query.push(("waypoints", waypoints.as_str()));
        }

        let body: DirectionsResponse = self.get_json("/maps/api/directions/json", &query).await?;
        check_status(
            &body.status,
            body.error_message.as_deref(),
            &format!("{} -> {}", req.origin, req.destination),
        )?;

        let route = body
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NotFound(req.destination.clone()))?;

        let legs = route
            .legs
            .into_iter()
            .map(|l| Leg {
                start_address: l.start_address,
                end_address: l.end_address,
                distance_m: l.distance.value,
                duration_s: l.duration.value,
                steps: l
                    .steps
                    .into_iter()
                    .map(|s| Step {
                        instruction: strip_html(&s.html_instructions),
                        distance_m: s.distance.value,
                        duration_s: s.duration.value,
                    })
                    .collect(),
            })
            .collect::<Vec<_>>();

        tracing::info!(
            mode = req.mode.as_str(),
            legs = legs.len(),
            "directions fetched"
        );
        Ok(Itinerary { legs })
    }

    async fn geocode(&self, address: &str) -> Result<GeocodedAddress, RoutingError> {
        let body: GeocodeResponse = self
            .get_json("/maps/api/geocode/json", &[("address", address)])
            .await?;
        check_status(&body.status, body.error_message.as_deref(), address)?;

        let first = body
            .results
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NotFound(address.to_string()))?;
        Ok(GeocodedAddress {
            formatted_address: first.formatted_address,
            location: LatLng {
                lat: first.geometry.location.lat,
                lng: first.geometry.location.lng,
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<RouteJson>,
}

#[derive(Debug, Deserialize)]
struct RouteJson {
    #[serde(default)]
    legs: Vec<LegJson>,
}

#[derive(Debug, Deserialize)]
struct LegJson {
    #[serde(default)]
    start_address: String,
    #[serde(default)]
    end_address: String,
    distance: ValueJson,
    duration: ValueJson,
    #[serde(default)]
    steps: Vec<StepJson>,
}

#[derive(Debug, Deserialize)]
struct StepJson {
    #[serde(default)]
    html_instructions: String,
    distance: ValueJson,
    duration: ValueJson,
}

/// `{ "value": 1234, "text": "1.2 km" }`; only the numeric value is kept.
#[derive(Debug, Deserialize)]
struct ValueJson {
    value: u64,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResultJson>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResultJson {
    formatted_address: String,
    geometry: GeometryJson,
}

#[derive(Debug, Deserialize)]
struct GeometryJson {
    location: LatLngJson,
}

#[derive(Debug, Deserialize)]
struct LatLngJson {
    lat: f64,
    lng: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert!(check_status("OK", None, "x").is_ok());
        assert!(matches!(
            check_status("ZERO_RESULTS", None, "x"),
            Err(RoutingError::NotFound(_))
        ));
        match check_status("REQUEST_DENIED", Some("The provided API key is invalid."), "x") {
            Err(RoutingError::Api { status, message }) => {
                assert_eq!(status, "REQUEST_DENIED");
                assert!(message.contains("invalid"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn debug_redacts_key() {
        let p = GoogleMapsProvider::new("AIza-super-secret".to_string());
        assert!(!format!("{p:?}").contains("super-secret"));
    }

    #[test]
    fn from_config_rejects_blank_key() {
        assert!(GoogleMapsProvider::from_config(" ".to_string(), &MapsConfig::default()).is_err());
        let p = GoogleMapsProvider::from_config("k".to_string(), &MapsConfig::default()).unwrap();
        assert_eq!(p.endpoint("/x"), "https://maps.googleapis.com/x");
    }
}

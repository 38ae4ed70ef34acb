//! Google Maps client against a local mock server (no network).

use ff_routing::{
    format_itinerary, DirectionsRequest, GoogleMapsProvider, RouteProvider, RoutingError,
    TravelMode,
};
use httpmock::prelude::*;
use serde_json::json;

fn request(mode: TravelMode) -> DirectionsRequest {
    DirectionsRequest {
        origin: "51 Rue Blaise Pascal, 35170 Bruz".to_string(),
        destination: "3 Place des Lices, 35000 Rennes".to_string(),
        waypoints: vec![],
        mode,
    }
}

#[tokio::test]
async fn directions_are_parsed_and_instructions_stripped() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/maps/api/directions/json")
                .query_param("origin", "51 Rue Blaise Pascal, 35170 Bruz")
                .query_param("destination", "3 Place des Lices, 35000 Rennes")
                .query_param("mode", "bicycling")
                .query_param("key", "test-key");
            then.status(200).json_body(json!({
                "status": "OK",
                "routes": [{
                    "legs": [{
                        "start_address": "51 Rue Blaise Pascal, 35170 Bruz, France",
                        "end_address": "3 Pl. des Lices, 35000 Rennes, France",
                        "distance": { "value": 11800, "text": "11.8 km" },
                        "duration": { "value": 2520, "text": "42 mins" },
                        "steps": [
                            {
                                "html_instructions": "Head <b>north</b> on <b>Rue Blaise Pascal</b>",
                                "distance": { "value": 400, "text": "0.4 km" },
                                "duration": { "value": 90, "text": "2 mins" }
                            },
                            {
                                "html_instructions": "Turn <b>right</b><div style=\"font-size:0.9em\">Destination will be on the left</div>",
                                "distance": { "value": 11400, "text": "11.4 km" },
                                "duration": { "value": 2430, "text": "41 mins" }
                            }
                        ]
                    }]
                }]
            }));
        })
        .await;

    let provider = GoogleMapsProvider::new_with_base_url("test-key".to_string(), server.base_url());
    let it = provider
        .directions(&request(TravelMode::Bicycling))
        .await
        .unwrap();
    mock.assert_async().await;

    assert_eq!(it.legs.len(), 1);
    assert_eq!(it.total_distance_m(), 11800);
    assert_eq!(it.total_duration_s(), 2520);
    assert_eq!(it.legs[0].steps[0].instruction, "Head north on Rue Blaise Pascal");
    assert_eq!(
        it.legs[0].steps[1].instruction,
        "Turn right Destination will be on the left"
    );

    let text = format_itinerary(&it);
    assert!(text.contains("1. Head north on Rue Blaise Pascal (400 m)"));
    assert!(text.trim_end().ends_with("Total: 11.8 km, 42 min"));
}

#[tokio::test]
async fn non_ok_status_becomes_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/directions/json");
            then.status(200).json_body(json!({
                "status": "REQUEST_DENIED",
                "error_message": "The provided API key is invalid.",
                "routes": []
            }));
        })
        .await;

    let provider = GoogleMapsProvider::new_with_base_url("bad".to_string(), server.base_url());
    let err = provider
        .directions(&request(TravelMode::Driving))
        .await
        .unwrap_err();
    match err {
        RoutingError::Api { status, message } => {
            assert_eq!(status, "REQUEST_DENIED");
            assert!(message.contains("API key"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn zero_results_is_not_found() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/directions/json");
            then.status(200)
                .json_body(json!({ "status": "ZERO_RESULTS", "routes": [] }));
        })
        .await;

    let provider = GoogleMapsProvider::new_with_base_url("k".to_string(), server.base_url());
    let err = provider
        .directions(&request(TravelMode::Walking))
        .await
        .unwrap_err();
    assert!(matches!(err, RoutingError::NotFound(_)));
}

#[tokio::test]
async fn http_error_is_reported() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/maps/api/geocode/json");
            then.status(503);
        })
        .await;

    let provider = GoogleMapsProvider::new_with_base_url("k".to_string(), server.base_url());
    let err = provider.geocode("nowhere").await.unwrap_err();
    assert!(matches!(err, RoutingError::Api { ref status, .. } if status == "HTTP_503"));
}

#[tokio::test]
async fn geocode_returns_first_result() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/maps/api/geocode/json")
                .query_param("address", "3 Place des Lices, 35000 Rennes");
            then.status(200).json_body(json!({
                "status": "OK",
                "results": [
                    {
                        "formatted_address": "3 Pl. des Lices, 35000 Rennes, France",
                        "geometry": { "location": { "lat": 48.1119, "lng": -1.6823 } }
                    },
                    {
                        "formatted_address": "elsewhere",
                        "geometry": { "location": { "lat": 0.0, "lng": 0.0 } }
                    }
                ]
            }));
        })
        .await;

    let provider = GoogleMapsProvider::new_with_base_url("k".to_string(), server.base_url());
    let g = provider
        .geocode("3 Place des Lices, 35000 Rennes")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(g.formatted_address, "3 Pl. des Lices, 35000 Rennes, France");
    assert!((g.location.lat - 48.1119).abs() < 1e-9);
    assert!((g.location.lng + 1.6823).abs() < 1e-9);
}

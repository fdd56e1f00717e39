//! The dashboard's HTTP surface wired to every fake.

#![allow(clippy::unwrap_used)]

use freight_tracker_core::{Coordinates, ShipmentStatus};
use freight_tracker_dashboard::config::DashboardConfig;
use freight_tracker_dashboard::realtime::ChannelState;
use freight_tracker_dashboard::state::AppState;
use freight_tracker_integration_tests::{
    CHICAGO, FakeApi, FakeBroker, FakeGeocoder, new_shipment, temp_cache_path, within,
};
use serde_json::{Value, json};

const DENVER: Coordinates = Coordinates::new(39.7392, -104.9903);

struct Harness {
    api: FakeApi,
    geocoder: FakeGeocoder,
    state: AppState,
    base: String,
    client: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let api = FakeApi::start().await.unwrap();
        let geocoder = FakeGeocoder::start(&[("Chicago", CHICAGO), ("Denver", DENVER)])
            .await
            .unwrap();
        let broker = FakeBroker::start().await.unwrap();

        let config = DashboardConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            api: api.config().unwrap(),
            realtime: broker.config(),
            geocode: geocoder.config(temp_cache_path("dashboard")).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        let state = AppState::new(config).await.unwrap();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let app = freight_tracker_dashboard::app(state.clone());
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            api,
            geocoder,
            state,
            base,
            client: reqwest::Client::new(),
        }
    }

    async fn get(&self, path: &str) -> (u16, Value) {
        let response = self
            .client
            .get(format!("{}{path}", self.base))
            .send()
            .await
            .unwrap();
        let status = response.status().as_u16();
        (status, response.json().await.unwrap_or(Value::Null))
    }
}

#[tokio::test]
async fn test_list_loads_store_lazily() {
    let harness = Harness::start().await;
    harness
        .api
        .seed(new_shipment("Chicago", "Denver", ShipmentStatus::InTransit));
    harness
        .api
        .seed(new_shipment("Boston", "Miami", ShipmentStatus::Pending));

    let (status, body) = harness.get("/api/shipments").await;

    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
    assert_eq!(harness.state.store().len(), 2);
}

#[tokio::test]
async fn test_create_then_show() {
    let harness = Harness::start().await;

    let response = harness
        .client
        .post(format!("{}/api/shipments", harness.base))
        .json(&json!({ "origin": "NYC", "destination": "LA", "carrier": "DHL" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);
    let created: Value = response.json().await.unwrap();
    assert_eq!(created["status"], "PENDING");
    assert!(!created["trackingNumber"].as_str().unwrap().is_empty());

    let (status, shown) = harness
        .get(&format!("/api/shipments/{}", created["id"]))
        .await;
    assert_eq!(status, 200);
    assert_eq!(shown["carrier"], "DHL");
    assert_eq!(harness.state.store().len(), 1);
}

#[tokio::test]
async fn test_blank_origin_is_bad_request() {
    let harness = Harness::start().await;

    let response = harness
        .client
        .post(format!("{}/api/shipments", harness.base))
        .json(&json!({ "origin": " ", "destination": "LA" }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 400);
    assert_eq!(harness.api.requests(), 0);
}

#[tokio::test]
async fn test_unknown_shipment_is_not_found() {
    let harness = Harness::start().await;

    let (status, body) = harness.get("/api/shipments/404").await;

    assert_eq!(status, 404);
    assert!(body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_routes_skip_unresolved_places() {
    let harness = Harness::start().await;
    harness
        .api
        .seed(new_shipment("Chicago", "Denver", ShipmentStatus::Delivered));
    harness
        .api
        .seed(new_shipment("Chicago", "Atlantis", ShipmentStatus::Pending));

    let (status, body) = harness.get("/api/routes").await;

    assert_eq!(status, 200);
    let routes = body.as_array().unwrap();
    assert_eq!(routes.len(), 1);
    assert_eq!(routes[0]["color"], "green");
    assert_eq!(routes[0]["origin"]["name"], "Chicago");
    // Chicago, Denver and Atlantis each looked up once.
    assert_eq!(harness.geocoder.requests(), 3);
}

#[tokio::test]
async fn test_search_and_stats() {
    let harness = Harness::start().await;
    harness
        .api
        .seed(new_shipment("Chicago", "Denver", ShipmentStatus::Delivered));
    harness
        .api
        .seed(new_shipment("Boston", "Denver", ShipmentStatus::Pending));

    let (status, page) = harness
        .get("/api/shipments/search?status=DELIVERED&page=0&size=10")
        .await;
    assert_eq!(status, 200);
    assert_eq!(page["content"].as_array().unwrap().len(), 1);
    assert_eq!(page["page"]["totalElements"], 1);

    let (status, stats) = harness.get("/api/stats").await;
    assert_eq!(status, 200);
    assert_eq!(stats["totalShipments"], 2);
    assert_eq!(stats["statusCounts"]["DELIVERED"], 1);
}

#[tokio::test]
async fn test_search_leaves_list_and_routes_whole() {
    let harness = Harness::start().await;
    harness
        .api
        .seed(new_shipment("Chicago", "Denver", ShipmentStatus::Delivered));
    harness
        .api
        .seed(new_shipment("Boston", "Miami", ShipmentStatus::Pending));
    harness
        .api
        .seed(new_shipment("Denver", "Chicago", ShipmentStatus::InTransit));

    let (_, before) = harness.get("/api/shipments").await;
    assert_eq!(before.as_array().unwrap().len(), 3);

    let (status, page) = harness
        .get("/api/shipments/search?status=DELIVERED&page=0&size=10")
        .await;
    assert_eq!(status, 200);
    assert_eq!(page["content"].as_array().unwrap().len(), 1);

    let (status, after) = harness.get("/api/shipments").await;
    assert_eq!(status, 200);
    assert_eq!(after.as_array().unwrap().len(), 3);
    assert_eq!(harness.state.store().len(), 3);

    let (_, routes) = harness.get("/api/routes").await;
    assert_eq!(routes.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_connection_state_follows_channel() {
    let harness = Harness::start().await;
    let (_, body) = harness.get("/api/connection").await;
    assert_eq!(body, json!({ "state": "DISCONNECTED" }));

    let mut states = harness.state.channel().watch_state();
    harness.state.channel().connect().await;
    within(states.wait_for(|s| s.is_subscribed()))
        .await
        .unwrap()
        .unwrap();

    let (_, body) = harness.get("/api/connection").await;
    assert_eq!(body, json!({ "state": "SUBSCRIBED" }));

    harness.state.channel().disconnect().await;
    assert_eq!(harness.state.channel().state(), ChannelState::Disconnected);
}

//! HTTP route handlers for the dashboard.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                 - Health check
//! GET    /api/connection         - Push channel state
//!
//! # Shipments
//! GET    /api/shipments          - Store snapshot (?refresh=true reloads)
//! POST   /api/shipments          - Create
//! GET    /api/shipments/search   - Search (?origin=&status=&page=&size=)
//! GET    /api/shipments/{id}     - Fetch one
//! PUT    /api/shipments/{id}     - Update
//! DELETE /api/shipments/{id}     - Delete
//!
//! # Views
//! GET    /api/stats              - Aggregate statistics
//! GET    /api/routes             - Geocoded routes for the map
//! ```

pub mod dashboard;
pub mod shipments;

use axum::{Router, routing::get};

use crate::state::AppState;

/// Create the API router.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/connection", get(dashboard::connection))
        .route("/shipments", get(shipments::list).post(shipments::create))
        .route("/shipments/search", get(shipments::search))
        .route(
            "/shipments/{id}",
            get(shipments::show)
                .put(shipments::update)
                .delete(shipments::delete),
        )
        .route("/stats", get(dashboard::stats))
        .route("/routes", get(dashboard::routes))
}

/// Full application router, without outer middleware.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes())
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::{ApiConfig, DashboardConfig, GeocodeConfig, RealtimeConfig};
    use crate::state::AppState;

    /// State whose remote endpoints all refuse connections.
    async fn offline_state() -> AppState {
        let cache = std::env::temp_dir().join(format!(
            "freight-routes-{}-{}.json",
            std::process::id(),
            rand::random::<u32>()
        ));
        let config = DashboardConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 0,
            api: ApiConfig::new("http://127.0.0.1:9/api").unwrap(),
            realtime: RealtimeConfig::new("ws://127.0.0.1:9/ws"),
            geocode: GeocodeConfig::new("http://127.0.0.1:9/search", cache).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };
        AppState::new(config).await.unwrap()
    }

    async fn get(uri: &str) -> (StatusCode, String) {
        let app = crate::app(offline_state().await);
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok");
    }

    #[tokio::test]
    async fn test_connection_starts_disconnected() {
        let (status, body) = get("/api/connection").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, r#"{"state":"DISCONNECTED"}"#);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_bad_gateway() {
        let (status, body) = get("/api/stats").await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body.contains("Shipment service error"));
    }

    #[tokio::test]
    async fn test_zero_page_size_is_bad_request() {
        let (status, _) = get("/api/shipments/search?size=0").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_rejected() {
        let (status, _) = get("/api/shipments/abc").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}

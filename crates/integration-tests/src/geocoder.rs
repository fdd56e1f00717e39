//! Fake Nominatim search endpoint.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use freight_tracker_core::Coordinates;
use freight_tracker_dashboard::config::{ConfigError, GeocodeConfig};
use serde_json::{Value, json};

/// Coordinates the fake returns for `Chicago`.
pub const CHICAGO: Coordinates = Coordinates::new(41.8781, -87.6298);

#[derive(Debug, Clone)]
struct Shared {
    places: Arc<HashMap<String, Coordinates>>,
    requests: Arc<AtomicUsize>,
}

/// Answers `GET /search?q=..` with at most one candidate.
///
/// Unknown places get `[]`. Degrees are sent as strings, as Nominatim does.
#[derive(Debug, Clone)]
pub struct FakeGeocoder {
    addr: SocketAddr,
    shared: Shared,
}

impl FakeGeocoder {
    /// Start with a fixed set of known places.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(places: &[(&str, Coordinates)]) -> std::io::Result<Self> {
        let shared = Shared {
            places: Arc::new(
                places
                    .iter()
                    .map(|(name, coordinates)| ((*name).to_string(), *coordinates))
                    .collect(),
            ),
            requests: Arc::new(AtomicUsize::new(0)),
        };
        let router = Router::new()
            .route("/search", get(search))
            .with_state(shared.clone());
        let addr = super::serve(router).await?;
        Ok(Self { addr, shared })
    }

    /// Start knowing only Chicago.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn chicago() -> std::io::Result<Self> {
        Self::start(&[("Chicago", CHICAGO)]).await
    }

    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}/search", self.addr)
    }

    /// Geocoder configuration persisting to `cache_path`.
    ///
    /// # Errors
    ///
    /// Never fails for a bound address.
    pub fn config(&self, cache_path: impl Into<PathBuf>) -> Result<GeocodeConfig, ConfigError> {
        GeocodeConfig::new(&self.endpoint(), cache_path)
    }

    /// Lookups served so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }
}

async fn search(
    State(shared): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Vec<Value>> {
    shared.requests.fetch_add(1, Ordering::SeqCst);
    let place = params.get("q").map(String::as_str).unwrap_or_default();
    let candidates = shared
        .places
        .get(place)
        .map(|c| {
            json!({
                "lat": c.latitude.to_string(),
                "lon": c.longitude.to_string(),
                "display_name": place,
            })
        })
        .into_iter()
        .collect();
    Json(candidates)
}

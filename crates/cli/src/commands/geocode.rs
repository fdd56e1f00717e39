//! Place name resolution through the persisted geocode cache.
//!
//! # Environment Variables
//!
//! - `FREIGHT_GEOCODE_URL` - Nominatim-compatible search endpoint
//! - `FREIGHT_GEOCODE_CACHE_PATH` - Cache file location

use freight_tracker_dashboard::config::GeocodeConfig;
use freight_tracker_dashboard::geocode::Geocoder;
use tracing::{info, warn};

use super::{CommandError, print_json};

/// Resolve `place` and print its coordinates, or `null` if it has no match.
///
/// # Errors
///
/// Returns an error if configuration is malformed or the cache cannot be
/// opened. Lookup failures print `null`.
pub async fn resolve(place: &str) -> Result<(), CommandError> {
    let config = GeocodeConfig::from_env()?;
    let geocoder = Geocoder::open(&config).await?;

    let cached = geocoder.cached(place).await.is_some();
    let coordinates = geocoder.resolve(place).await;

    match coordinates {
        Some(c) => info!(place, cached, %c, "Resolved place"),
        None => warn!(place, "Place could not be resolved"),
    }

    print_json(&serde_json::json!({
        "place": place,
        "coordinates": coordinates,
        "cached": cached,
    }))
}

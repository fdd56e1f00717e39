//! Place name geocoding with a persisted cache.
//!
//! Lookups go to a Nominatim-compatible search endpoint. Every successful
//! result is kept in memory for the life of the process and written to a JSON
//! file so the next start does not repeat it. Failures are never cached.

mod file;

pub use file::CacheFile;

use std::collections::BTreeMap;
use std::sync::Arc;

use freight_tracker_core::Coordinates;
use moka::future::Cache;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::{self, GeocodeConfig};

/// Lookup failures. Callers of [`Geocoder::resolve`] only ever see `None`.
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Geocoder returned {0}")]
    Status(u16),

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid coordinate {0:?}")]
    InvalidCoordinate(String),

    #[error("Cache file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Something that turns place names into coordinates.
pub trait PlaceResolver {
    fn resolve(&self, place: &str) -> impl Future<Output = Option<Coordinates>> + Send;
}

/// Memoizing geocoder.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Geocoder {
    inner: Arc<GeocoderInner>,
}

struct GeocoderInner {
    client: reqwest::Client,
    endpoint: Url,
    cache: Cache<String, Coordinates>,
    /// Mirror of the cache in file order, guarded so writes are serialized.
    persisted: Mutex<BTreeMap<String, Coordinates>>,
    file: CacheFile,
}

impl std::fmt::Debug for Geocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Geocoder")
            .field("endpoint", &self.inner.endpoint.as_str())
            .field("file", &self.inner.file)
            .finish_non_exhaustive()
    }
}

/// One search candidate. Nominatim sends degrees as strings.
#[derive(Debug, Deserialize)]
struct Candidate {
    lat: Degrees,
    lon: Degrees,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Degrees {
    Text(String),
    Number(f64),
}

impl Degrees {
    fn value(&self) -> Result<f64, GeocodeError> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| GeocodeError::InvalidCoordinate(s.clone())),
        }
    }
}

impl Geocoder {
    /// Create a geocoder, seeding the cache from the configured file.
    ///
    /// A missing file starts empty. An unreadable or corrupt file is logged
    /// and also starts empty; it is overwritten on the next success.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub async fn open(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(config::USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        let file = CacheFile::new(config.cache_path.clone());
        let entries = match file.load().await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(
                    error = %e,
                    path = %file.path().display(),
                    "Ignoring unreadable geocode cache"
                );
                BTreeMap::new()
            }
        };

        let cache = Cache::builder().build();
        for (place, coordinates) in &entries {
            cache.insert(place.clone(), *coordinates).await;
        }
        debug!(entries = entries.len(), "Geocode cache seeded");

        Ok(Self {
            inner: Arc::new(GeocoderInner {
                client,
                endpoint: config.endpoint.clone(),
                cache,
                persisted: Mutex::new(entries),
                file,
            }),
        })
    }

    /// Coordinates for `place`, or `None` when it cannot be resolved.
    ///
    /// Concurrent calls for the same name share one lookup.
    #[instrument(skip(self))]
    pub async fn resolve(&self, place: &str) -> Option<Coordinates> {
        if place.trim().is_empty() {
            return None;
        }
        self.inner
            .cache
            .optionally_get_with(place.to_owned(), self.lookup_and_persist(place))
            .await
    }

    /// Cached coordinates without any network access.
    pub async fn cached(&self, place: &str) -> Option<Coordinates> {
        self.inner.cache.get(place).await
    }

    /// Number of places held in the persisted mapping.
    pub async fn persisted_len(&self) -> usize {
        self.inner.persisted.lock().await.len()
    }

    async fn lookup_and_persist(&self, place: &str) -> Option<Coordinates> {
        match self.lookup(place).await {
            Ok(Some(coordinates)) => {
                self.persist(place, coordinates).await;
                Some(coordinates)
            }
            Ok(None) => {
                debug!(place, "No geocoding candidates");
                None
            }
            Err(e) => {
                warn!(place, error = %e, "Geocoding failed");
                None
            }
        }
    }

    async fn lookup(&self, place: &str) -> Result<Option<Coordinates>, GeocodeError> {
        let mut url = self.inner.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("format", "json")
            .append_pair("q", place)
            .append_pair("limit", "1");

        let response = self.inner.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GeocodeError::Status(status.as_u16()));
        }

        let body = response.text().await?;
        let candidates: Vec<Candidate> = serde_json::from_str(&body)?;
        let Some(first) = candidates.into_iter().next() else {
            return Ok(None);
        };

        let coordinates = Coordinates::new(first.lat.value()?, first.lon.value()?);
        if !coordinates.is_valid() {
            return Err(GeocodeError::InvalidCoordinate(coordinates.to_string()));
        }
        Ok(Some(coordinates))
    }

    async fn persist(&self, place: &str, coordinates: Coordinates) {
        let mut entries = self.inner.persisted.lock().await;
        entries.insert(place.to_owned(), coordinates);
        if let Err(e) = self.inner.file.save(&entries).await {
            warn!(
                error = %e,
                path = %self.inner.file.path().display(),
                "Failed to persist geocode cache"
            );
        }
    }
}

impl PlaceResolver for Geocoder {
    fn resolve(&self, place: &str) -> impl Future<Output = Option<Coordinates>> + Send {
        Self::resolve(self, place)
    }
}

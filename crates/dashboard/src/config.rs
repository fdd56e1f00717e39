//! Dashboard configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `FREIGHT_API_URL` - Base URL of the remote shipment API
//!
//! ## Optional
//! - `FREIGHT_API_TOKEN` - Bearer token sent with every API request
//! - `FREIGHT_REQUEST_TIMEOUT_SECS` - API request timeout (default: 30)
//! - `FREIGHT_WS_URL` - STOMP WebSocket endpoint (default: `ws://localhost:8080/ws`)
//! - `FREIGHT_WS_TOPIC` - Push destination (default: `/topic/shipments`)
//! - `FREIGHT_RECONNECT_DELAY_MS` - Delay between reconnect attempts (default: 5000)
//! - `FREIGHT_REJECT_STALE_PUSHES` - Drop pushes older than the stored record (default: false)
//! - `FREIGHT_GEOCODE_URL` - Nominatim search endpoint
//! - `FREIGHT_GEOCODE_CACHE_PATH` - Persisted geocode cache (default: `geocodeCache.json`)
//! - `DASHBOARD_HOST` - Bind address (default: 127.0.0.1)
//! - `DASHBOARD_PORT` - Listen port (default: 3000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Error sample rate, 0.0 to 1.0 (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Transaction sample rate, 0.0 to 1.0 (default: 0.0)

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws";
pub const DEFAULT_TOPIC: &str = "/topic/shipments";
pub const DEFAULT_GEOCODE_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const DEFAULT_GEOCODE_CACHE_PATH: &str = "geocodeCache.json";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(5000);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Nominatim's usage policy requires an identifying agent.
pub const USER_AGENT: &str = concat!(
    "freight-tracker-dashboard/",
    env!("CARGO_PKG_VERSION"),
    " (+https://github.com/freight-tracker/freight-tracker)"
);

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Dashboard application configuration.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Remote shipment API
    pub api: ApiConfig,
    /// Push channel
    pub realtime: RealtimeConfig,
    /// Geocoding endpoint and cache file
    pub geocode: GeocodeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. production, staging)
    pub sentry_environment: Option<String>,
    /// Fraction of errors sent to Sentry
    pub sentry_sample_rate: f32,
    /// Fraction of transactions sent to Sentry
    pub sentry_traces_sample_rate: f32,
}

/// Remote shipment API configuration.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct ApiConfig {
    /// Base URL, always ending in `/` so relative joins stay under it
    pub base_url: Url,
    /// Optional bearer token
    pub token: Option<SecretString>,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiConfig")
            .field("base_url", &self.base_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Push channel configuration.
#[derive(Debug, Clone)]
pub struct RealtimeConfig {
    /// WebSocket endpoint speaking STOMP
    pub ws_url: String,
    /// Destination to subscribe to
    pub topic: String,
    /// Fixed delay before every reconnect attempt
    pub reconnect_delay: Duration,
    /// Use `upsert_if_newer` for pushed shipments
    pub reject_stale_pushes: bool,
}

/// Geocoding configuration.
#[derive(Debug, Clone)]
pub struct GeocodeConfig {
    /// Nominatim-compatible search endpoint
    pub endpoint: Url,
    /// JSON file holding resolved places
    pub cache_path: PathBuf,
    /// Request timeout
    pub timeout: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("DASHBOARD_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("DASHBOARD_PORT", "3000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("DASHBOARD_PORT".to_string(), e.to_string()))?;

        Ok(Self {
            host,
            port,
            api: ApiConfig::from_env()?,
            realtime: RealtimeConfig::from_env()?,
            geocode: GeocodeConfig::from_env()?,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_rate(
                "SENTRY_SAMPLE_RATE",
                &get_env_or_default("SENTRY_SAMPLE_RATE", "1.0"),
            )?,
            sentry_traces_sample_rate: parse_rate(
                "SENTRY_TRACES_SAMPLE_RATE",
                &get_env_or_default("SENTRY_TRACES_SAMPLE_RATE", "0.0"),
            )?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ApiConfig {
    /// Build a config for `base_url` with no token and the default timeout.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL does not parse.
    pub fn new(base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url("FREIGHT_API_URL", base_url)?,
            token: None,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Load the API section from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `FREIGHT_API_URL` is missing or malformed.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let base_url = parse_base_url("FREIGHT_API_URL", &get_required_env("FREIGHT_API_URL")?)?;
        let token = get_optional_env("FREIGHT_API_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .map(SecretString::from);
        let timeout = Duration::from_secs(parse_u64(
            "FREIGHT_REQUEST_TIMEOUT_SECS",
            &get_env_or_default("FREIGHT_REQUEST_TIMEOUT_SECS", "30"),
        )?);

        Ok(Self {
            base_url,
            token,
            timeout,
        })
    }
}

impl RealtimeConfig {
    /// Config for `ws_url` with the default topic and delay.
    #[must_use]
    pub fn new(ws_url: impl Into<String>) -> Self {
        Self {
            ws_url: ws_url.into(),
            topic: DEFAULT_TOPIC.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            reject_stale_pushes: false,
        }
    }

    /// Load the push channel section from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` for malformed numbers or flags.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let reconnect_delay = parse_delay_ms(
            "FREIGHT_RECONNECT_DELAY_MS",
            &get_env_or_default("FREIGHT_RECONNECT_DELAY_MS", "5000"),
        )?;
        let reject_stale_pushes = parse_bool(
            "FREIGHT_REJECT_STALE_PUSHES",
            &get_env_or_default("FREIGHT_REJECT_STALE_PUSHES", "false"),
        )?;

        Ok(Self {
            ws_url: get_env_or_default("FREIGHT_WS_URL", DEFAULT_WS_URL),
            topic: get_env_or_default("FREIGHT_WS_TOPIC", DEFAULT_TOPIC),
            reconnect_delay,
            reject_stale_pushes,
        })
    }
}

impl GeocodeConfig {
    /// Config for `endpoint` persisting to `cache_path`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the endpoint does not parse.
    pub fn new(endpoint: &str, cache_path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        Ok(Self {
            endpoint: Url::parse(endpoint).map_err(|e| {
                ConfigError::InvalidEnvVar("FREIGHT_GEOCODE_URL".to_string(), e.to_string())
            })?,
            cache_path: cache_path.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    /// Load the geocoding section from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the endpoint does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Self::new(
            &get_env_or_default("FREIGHT_GEOCODE_URL", DEFAULT_GEOCODE_URL),
            get_env_or_default("FREIGHT_GEOCODE_CACHE_PATH", DEFAULT_GEOCODE_CACHE_PATH),
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse a base URL and make sure its path ends in `/`.
fn parse_base_url(key: &str, value: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(value.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "not a hierarchical URL".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Parse a non-zero millisecond delay.
fn parse_delay_ms(key: &str, value: &str) -> Result<Duration, ConfigError> {
    match parse_u64(key, value)? {
        0 => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "delay must be at least 1ms".to_string(),
        )),
        ms => Ok(Duration::from_millis(ms)),
    }
}

/// Parse a sample rate in `0.0..=1.0`.
fn parse_rate(key: &str, value: &str) -> Result<f32, ConfigError> {
    let rate = value
        .trim()
        .parse::<f32>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if !(0.0..=1.0).contains(&rate) {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("must be between 0.0 and 1.0 (got {rate})"),
        ));
    }
    Ok(rate)
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got {other:?}"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_base_url_appends_slash() {
        let url = parse_base_url("K", "http://localhost:8080/api").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/api/");
        assert_eq!(
            url.join("shipments/search").unwrap().as_str(),
            "http://localhost:8080/api/shipments/search"
        );
    }

    #[test]
    fn test_parse_base_url_keeps_existing_slash() {
        let url = parse_base_url("K", "http://localhost:8080/").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/");
    }

    #[test]
    fn test_parse_base_url_rejects_garbage() {
        let err = parse_base_url("FREIGHT_API_URL", "not a url").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar(key, _) if key == "FREIGHT_API_URL"));
        assert!(parse_base_url("K", "mailto:ops@example.com").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("K", "TRUE").unwrap());
        assert!(parse_bool("K", "1").unwrap());
        assert!(!parse_bool("K", "off").unwrap());
        assert!(parse_bool("K", "maybe").is_err());
    }

    #[test]
    fn test_parse_rate() {
        assert!((parse_rate("K", "0.25").unwrap() - 0.25).abs() < f32::EPSILON);
        assert!(parse_rate("K", "1.5").is_err());
        assert!(parse_rate("K", "NaN").is_err());
    }

    #[test]
    fn test_parse_u64() {
        assert_eq!(parse_u64("K", " 5000 ").unwrap(), 5000);
        assert!(parse_u64("K", "-1").is_err());
    }

    #[test]
    fn test_parse_delay_rejects_zero() {
        assert_eq!(
            parse_delay_ms("K", "250").unwrap(),
            Duration::from_millis(250)
        );
        let err = parse_delay_ms("FREIGHT_RECONNECT_DELAY_MS", " 0 ").unwrap_err();
        assert!(err.to_string().contains("FREIGHT_RECONNECT_DELAY_MS"));
    }

    #[test]
    fn test_socket_addr() {
        let config = DashboardConfig {
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            api: ApiConfig::new("http://localhost:8080/api").unwrap(),
            realtime: RealtimeConfig::new(DEFAULT_WS_URL),
            geocode: GeocodeConfig::new(DEFAULT_GEOCODE_URL, DEFAULT_GEOCODE_CACHE_PATH).unwrap(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_realtime_defaults() {
        let config = RealtimeConfig::new("ws://broker/ws");
        assert_eq!(config.topic, "/topic/shipments");
        assert_eq!(config.reconnect_delay, Duration::from_secs(5));
        assert!(!config.reject_stale_pushes);
    }

    #[test]
    fn test_api_config_debug_redacts_token() {
        let mut config = ApiConfig::new("http://localhost:8080/api").unwrap();
        config.token = Some(SecretString::from("super_secret_token_value"));

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("localhost:8080"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_token_value"));
    }
}

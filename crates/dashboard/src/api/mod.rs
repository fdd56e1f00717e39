//! Remote shipment API client.
//!
//! # Architecture
//!
//! - One `reqwest::Client` per [`ShipmentApiClient`], shared through `Arc`
//! - Plain REST + JSON; every call maps to one request
//! - Nothing is cached here; the [`crate::store::ShipmentStore`] holds state
//!
//! # Example
//!
//! ```rust,ignore
//! use freight_tracker_dashboard::api::{SearchQuery, ShipmentApiClient};
//!
//! let client = ShipmentApiClient::new(&config.api)?;
//! let delivered = client
//!     .search(&SearchQuery::default().with_status(ShipmentStatus::Delivered))
//!     .await?;
//! ```

mod client;
mod query;

pub use client::ShipmentApiClient;
pub use query::{DEFAULT_PAGE_SIZE, SearchQuery};

use freight_tracker_core::{ShipmentError, ShipmentId};
use thiserror::Error;

/// Errors that can occur when talking to the shipment API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure, no usable response.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The shipment does not exist remotely.
    #[error("Not found: shipment {0}")]
    NotFound(ShipmentId),

    /// Non-success response.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// Response body could not be decoded.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Rejected before sending.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl From<ShipmentError> for ApiError {
    fn from(err: ShipmentError) -> Self {
        Self::InvalidRequest(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidRequest(format!("invalid URL: {err}"))
    }
}

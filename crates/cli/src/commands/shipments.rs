//! Shipment commands against the remote API.
//!
//! # Usage
//!
//! ```bash
//! ft-cli list
//! ft-cli get 42
//! ft-cli create --origin NYC --destination LA --carrier DHL
//! ft-cli update 42 --status in-transit
//! ft-cli delete 42
//! ft-cli search --origin Chicago --status delivered
//! ft-cli stats
//! ```
//!
//! # Environment Variables
//!
//! - `FREIGHT_API_URL` - Base URL of the shipment service
//! - `FREIGHT_API_TOKEN` - Optional bearer token

use freight_tracker_core::{NewShipment, Priority, ShipmentId, ShipmentPatch, ShipmentStatus};
use freight_tracker_dashboard::api::{SearchQuery, ShipmentApiClient};
use freight_tracker_dashboard::config::ApiConfig;
use tracing::info;

use super::{CommandError, print_json};

/// Fields for `ft-cli create`.
#[derive(Debug, Clone)]
pub struct CreateArgs {
    pub origin: String,
    pub destination: String,
    pub status: Option<ShipmentStatus>,
    pub priority: Option<Priority>,
    pub carrier: Option<String>,
}

impl From<CreateArgs> for NewShipment {
    fn from(args: CreateArgs) -> Self {
        let mut shipment = Self::new(args.origin, args.destination)
            .with_status(args.status.unwrap_or_default())
            .with_priority(args.priority.unwrap_or_default());
        if let Some(carrier) = args.carrier {
            shipment = shipment.with_carrier(carrier);
        }
        shipment
    }
}

fn client() -> Result<ShipmentApiClient, CommandError> {
    let config = ApiConfig::from_env()?;
    Ok(ShipmentApiClient::new(&config)?)
}

/// Print every shipment, most recently updated first.
///
/// # Errors
///
/// Returns an error if configuration is missing or the request fails.
pub async fn list() -> Result<(), CommandError> {
    let mut shipments = client()?.fetch_all().await?;
    shipments.sort_by(|a, b| {
        b.last_updated_time
            .cmp(&a.last_updated_time)
            .then_with(|| a.id.cmp(&b.id))
    });
    info!(count = shipments.len(), "Fetched shipments");
    print_json(&shipments)
}

/// Print one shipment.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the id does not exist.
pub async fn get(id: ShipmentId) -> Result<(), CommandError> {
    let shipment = client()?.fetch_one(id).await?;
    print_json(&shipment)
}

/// Create a shipment and print the stored record.
///
/// # Errors
///
/// Returns an error if a place name is blank or the request fails.
pub async fn create(args: CreateArgs) -> Result<(), CommandError> {
    let shipment = NewShipment::from(args);
    let created = client()?.create(&shipment).await?;
    info!(
        id = %created.id,
        tracking_number = %created.tracking_number,
        "Created shipment"
    );
    print_json(&created)
}

/// Apply `patch` and print the updated record.
///
/// # Errors
///
/// Returns an error if the patch is empty or the request fails.
pub async fn update(id: ShipmentId, patch: ShipmentPatch) -> Result<(), CommandError> {
    let updated = client()?.update(id, &patch).await?;
    info!(id = %updated.id, status = %updated.status, "Updated shipment");
    print_json(&updated)
}

/// Delete a shipment.
///
/// # Errors
///
/// Returns `ApiError::NotFound` if the id does not exist.
pub async fn delete(id: ShipmentId) -> Result<(), CommandError> {
    client()?.delete(id).await?;
    info!(%id, "Deleted shipment");
    print_json(&serde_json::json!({ "deleted": id }))
}

/// Print one page of search results.
///
/// # Errors
///
/// Returns an error if the page size is zero or the request fails.
pub async fn search(query: &SearchQuery) -> Result<(), CommandError> {
    let page = client()?.search(query).await?;
    info!(
        results = page.len(),
        total = page.page.total_elements,
        "Search complete"
    );
    print_json(&page)
}

/// Print aggregate statistics.
///
/// # Errors
///
/// Returns an error if the request fails.
pub async fn stats() -> Result<(), CommandError> {
    let stats = client()?.stats().await?;
    print_json(&stats)
}

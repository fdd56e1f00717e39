//! Shipment CRUD and search handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use freight_tracker_core::{
    NewShipment, Page, Priority, Shipment, ShipmentId, ShipmentPatch, ShipmentStatus,
    TrackingNumber,
};
use serde::Deserialize;

use crate::api::SearchQuery;
use crate::error::Result;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Reload everything from the API before answering.
    #[serde(default)]
    pub refresh: bool,
}

/// Create form. Only the places are required.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateShipmentRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub status: Option<ShipmentStatus>,
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(default)]
    pub carrier: Option<String>,
    #[serde(default)]
    pub tracking_number: Option<String>,
}

impl From<CreateShipmentRequest> for NewShipment {
    fn from(request: CreateShipmentRequest) -> Self {
        let mut shipment = Self::new(request.origin, request.destination)
            .with_status(request.status.unwrap_or_default())
            .with_priority(request.priority.unwrap_or_default());
        if let Some(carrier) = request.carrier {
            shipment = shipment.with_carrier(carrier);
        }
        if let Some(tracking_number) = request.tracking_number {
            shipment.tracking_number = TrackingNumber::new(tracking_number);
            shipment.ensure_tracking_number();
        }
        shipment
    }
}

/// Store contents, most recently updated first.
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<Shipment>>> {
    if params.refresh {
        state.sync().load_all().await?;
    } else {
        state.sync().ensure_loaded().await?;
    }
    let shipments = state
        .store()
        .list_sorted()
        .iter()
        .map(|shipment| Shipment::clone(shipment))
        .collect();
    Ok(Json(shipments))
}

pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateShipmentRequest>,
) -> Result<(StatusCode, Json<Shipment>)> {
    let created = state.sync().create(request.into()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Search; the store is left as it is.
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<Shipment>>> {
    Ok(Json(state.sync().search(&query).await?))
}

pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ShipmentId>,
) -> Result<Json<Shipment>> {
    Ok(Json(state.sync().refresh(id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<ShipmentId>,
    Json(patch): Json<ShipmentPatch>,
) -> Result<Json<Shipment>> {
    Ok(Json(state.sync().update(id, &patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<ShipmentId>,
) -> Result<StatusCode> {
    state.sync().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

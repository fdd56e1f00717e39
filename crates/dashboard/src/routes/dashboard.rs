//! Read-model handlers: statistics, map routes, connection state.

use axum::{Json, extract::State};
use freight_tracker_core::ShipmentStats;

use crate::error::Result;
use crate::map::{ShipmentRoute, build_routes};
use crate::realtime::ChannelState;
use crate::state::AppState;

pub async fn stats(State(state): State<AppState>) -> Result<Json<ShipmentStats>> {
    Ok(Json(state.sync().stats().await?))
}

/// Routes for every store entry whose ends geocode.
pub async fn routes(State(state): State<AppState>) -> Result<Json<Vec<ShipmentRoute>>> {
    state.sync().ensure_loaded().await?;
    let shipments = state.store().list_sorted();
    Ok(Json(build_routes(&shipments, state.geocoder()).await))
}

pub async fn connection(State(state): State<AppState>) -> Json<ChannelState> {
    Json(state.channel().state())
}

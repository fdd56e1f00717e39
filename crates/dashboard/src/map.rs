//! Map read-model: one drawable route per geocodable shipment.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use freight_tracker_core::{
    Coordinates, Priority, Shipment, ShipmentId, ShipmentStatus, TrackingNumber,
};
use serde::Serialize;
use tracing::debug;

use crate::geocode::PlaceResolver;

/// Line color by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RouteColor {
    Gray,
    Orange,
    Green,
    Red,
}

impl From<ShipmentStatus> for RouteColor {
    fn from(status: ShipmentStatus) -> Self {
        match status {
            ShipmentStatus::Pending => Self::Gray,
            ShipmentStatus::InTransit => Self::Orange,
            ShipmentStatus::Delivered => Self::Green,
            ShipmentStatus::Cancelled => Self::Red,
        }
    }
}

/// A named, resolved end of a route.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteEnd {
    pub name: String,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentRoute {
    pub shipment_id: ShipmentId,
    pub tracking_number: TrackingNumber,
    pub status: ShipmentStatus,
    pub priority: Priority,
    #[serde(with = "freight_tracker_core::types::timestamp")]
    pub last_updated_time: DateTime<Utc>,
    pub origin: RouteEnd,
    pub destination: RouteEnd,
    pub color: RouteColor,
}

/// Resolve both ends of every shipment, skipping those that fail.
///
/// Lookups run one after another so repeated names hit the cache.
pub async fn build_routes<R: PlaceResolver + Sync>(
    shipments: &[Arc<Shipment>],
    resolver: &R,
) -> Vec<ShipmentRoute> {
    let mut routes = Vec::with_capacity(shipments.len());
    for shipment in shipments {
        let Some(origin) = resolver.resolve(&shipment.origin).await else {
            debug!(
                shipment_id = %shipment.id,
                place = %shipment.origin,
                "Skipping route, origin unresolved"
            );
            continue;
        };
        let Some(destination) = resolver.resolve(&shipment.destination).await else {
            debug!(
                shipment_id = %shipment.id,
                place = %shipment.destination,
                "Skipping route, destination unresolved"
            );
            continue;
        };
        routes.push(ShipmentRoute {
            shipment_id: shipment.id,
            tracking_number: shipment.tracking_number.clone(),
            status: shipment.status,
            priority: shipment.effective_priority(),
            last_updated_time: shipment.last_updated_time,
            origin: RouteEnd {
                name: shipment.origin.clone(),
                coordinates: origin,
            },
            destination: RouteEnd {
                name: shipment.destination.clone(),
                coordinates: destination,
            },
            color: shipment.status.into(),
        });
    }
    routes
}

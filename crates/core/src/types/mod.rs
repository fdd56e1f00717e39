//! Core types for Freight Tracker.
//!
//! This module provides type-safe wrappers for shipments and the values
//! derived from them.

pub mod geo;
pub mod id;
pub mod page;
pub mod shipment;
pub mod stats;
pub mod status;
pub mod timestamp;

pub use geo::Coordinates;
pub use id::*;
pub use page::{Page, PageMetadata};
pub use shipment::{
    NewShipment, Shipment, ShipmentError, ShipmentPatch, ShipmentUpdateMessage, TrackingNumber,
};
pub use stats::{ShipmentStats, StatusCounts};
pub use status::*;

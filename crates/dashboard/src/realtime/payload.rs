//! Decoding of MESSAGE bodies into store writes.

use freight_tracker_core::{Shipment, ShipmentId, ShipmentUpdateMessage};
use serde::Deserialize;
use tracing::{debug, warn};

use super::RealtimeError;
use crate::store::ShipmentStore;

/// A pushed change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PushPayload {
    /// A complete record.
    Shipment(Shipment),
    /// A status-only change for a record the client already holds.
    StatusChange(ShipmentUpdateMessage),
}

impl PushPayload {
    /// Decode a MESSAGE body.
    ///
    /// # Errors
    ///
    /// Returns `RealtimeError::Decode` when the body matches neither shape.
    pub fn decode(body: &str) -> Result<Self, RealtimeError> {
        Ok(serde_json::from_str(body)?)
    }

    #[must_use]
    pub const fn shipment_id(&self) -> ShipmentId {
        match self {
            Self::Shipment(shipment) => shipment.id,
            Self::StatusChange(message) => message.shipment_id,
        }
    }
}

/// Outcome of applying a push to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// Record written.
    Upserted(ShipmentId),
    /// Older than the stored record; dropped.
    Stale(ShipmentId),
    /// Status change for an id the store does not hold; dropped.
    Unknown(ShipmentId),
}

/// Write a push into the store.
///
/// With `reject_stale` set, full records older than the stored one are
/// dropped.
pub fn apply_payload(store: &ShipmentStore, payload: PushPayload, reject_stale: bool) -> Applied {
    match payload {
        PushPayload::Shipment(shipment) => {
            let id = shipment.id;
            if reject_stale {
                if store.upsert_if_newer(shipment) {
                    Applied::Upserted(id)
                } else {
                    Applied::Stale(id)
                }
            } else {
                store.upsert(shipment);
                Applied::Upserted(id)
            }
        }
        PushPayload::StatusChange(message) => {
            let id = message.shipment_id;
            if store.apply_status_update(&message) {
                Applied::Upserted(id)
            } else {
                warn!(
                    shipment_id = %id,
                    status = %message.status,
                    "Status change for unknown shipment"
                );
                Applied::Unknown(id)
            }
        }
    }
}

/// Decode and apply one MESSAGE body. Malformed bodies are logged and dropped.
pub(super) fn handle_message(store: &ShipmentStore, body: &str, reject_stale: bool) {
    match PushPayload::decode(body) {
        Ok(payload) => {
            let outcome = apply_payload(store, payload, reject_stale);
            debug!(?outcome, "Applied push");
        }
        Err(e) => {
            warn!(
                error = %e,
                body = %body.chars().take(200).collect::<String>(),
                "Dropping malformed push"
            );
        }
    }
}

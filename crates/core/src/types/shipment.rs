//! Shipment records and the request bodies that create or modify them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::id::ShipmentId;
use super::status::{Priority, ShipmentStatus};

/// Errors raised when a shipment request fails local validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ShipmentError {
    /// A required place name is empty.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),
    /// The patch does not change anything.
    #[error("update must change at least one field")]
    EmptyPatch,
}

/// Opaque tracking identifier, generated once when a shipment is created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingNumber(String);

impl TrackingNumber {
    /// Length of generated tracking numbers.
    pub const GENERATED_LENGTH: usize = 8;

    /// Wrap an existing tracking number.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Generate a fresh upper-case base-36 tracking number.
    #[must_use]
    pub fn generate() -> Self {
        use rand::Rng;

        let mut rng = rand::rng();
        let value = (0..Self::GENERATED_LENGTH)
            .filter_map(|_| char::from_digit(rng.random_range(0..36), 36))
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(value)
    }

    /// Returns the tracking number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the tracking number is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Display for TrackingNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrackingNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A tracked freight shipment as returned by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    /// Remote-assigned primary key.
    pub id: ShipmentId,
    /// Free-text origin place name.
    pub origin: String,
    /// Free-text destination place name.
    pub destination: String,
    /// Current lifecycle stage.
    pub status: ShipmentStatus,
    /// Opaque tracking identifier.
    pub tracking_number: TrackingNumber,
    /// Carrier name, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    /// Handling priority; `None` means [`Priority::Low`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Time of the most recent server-side mutation. Display only.
    #[serde(with = "super::timestamp")]
    pub last_updated_time: DateTime<Utc>,
}

impl Shipment {
    /// Priority with the `LOW` default applied.
    #[must_use]
    pub fn effective_priority(&self) -> Priority {
        self.priority.unwrap_or_default()
    }

    /// A copy of this record carrying a new status and update time.
    #[must_use]
    pub fn with_status(&self, status: ShipmentStatus, updated_at: DateTime<Utc>) -> Self {
        Self {
            status,
            last_updated_time: updated_at,
            ..self.clone()
        }
    }
}

/// Request body for creating a shipment.
///
/// The server assigns `id` and `lastUpdatedTime`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShipment {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub status: ShipmentStatus,
    pub tracking_number: TrackingNumber,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl NewShipment {
    /// A pending, low-priority shipment with a freshly generated tracking number.
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            status: ShipmentStatus::Pending,
            tracking_number: TrackingNumber::generate(),
            carrier: None,
            priority: Some(Priority::Low),
        }
    }

    /// Set the initial status.
    #[must_use]
    pub const fn with_status(mut self, status: ShipmentStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = Some(priority);
        self
    }

    /// Set the carrier. Blank carriers are dropped.
    #[must_use]
    pub fn with_carrier(mut self, carrier: impl Into<String>) -> Self {
        let carrier = carrier.into();
        self.carrier = (!carrier.trim().is_empty()).then_some(carrier);
        self
    }

    /// Replace a blank tracking number with a generated one.
    pub fn ensure_tracking_number(&mut self) {
        if self.tracking_number.is_blank() {
            self.tracking_number = TrackingNumber::generate();
        }
    }

    /// Check that both place names are present.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::EmptyField`] naming the first blank place.
    pub fn validate(&self) -> Result<(), ShipmentError> {
        if self.origin.trim().is_empty() {
            return Err(ShipmentError::EmptyField("origin"));
        }
        if self.destination.trim().is_empty() {
            return Err(ShipmentError::EmptyField("destination"));
        }
        if self.tracking_number.is_blank() {
            return Err(ShipmentError::EmptyField("trackingNumber"));
        }
        Ok(())
    }
}

/// Partial update body. Only supplied fields change server-side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ShipmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub carrier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl ShipmentPatch {
    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.origin.is_none()
            && self.destination.is_none()
            && self.status.is_none()
            && self.carrier.is_none()
            && self.priority.is_none()
    }

    /// Reject empty patches and blank place names.
    ///
    /// # Errors
    ///
    /// Returns [`ShipmentError::EmptyPatch`] or [`ShipmentError::EmptyField`].
    pub fn validate(&self) -> Result<(), ShipmentError> {
        if self.is_empty() {
            return Err(ShipmentError::EmptyPatch);
        }
        if self.origin.as_deref().is_some_and(|o| o.trim().is_empty()) {
            return Err(ShipmentError::EmptyField("origin"));
        }
        if self
            .destination
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            return Err(ShipmentError::EmptyField("destination"));
        }
        Ok(())
    }
}

/// Status-only change notification broadcast by some servers instead of a
/// full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentUpdateMessage {
    pub shipment_id: ShipmentId,
    pub tracking_number: TrackingNumber,
    pub status: ShipmentStatus,
    #[serde(with = "super::timestamp")]
    pub last_updated_time: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHIPMENT_JSON: &str = r#"{
        "id": 12,
        "origin": "Chicago",
        "destination": "Denver",
        "status": "IN_TRANSIT",
        "trackingNumber": "QX81ZK2A",
        "carrier": "UPS",
        "priority": "HIGH",
        "lastUpdatedTime": "2025-03-04T10:15:30.123"
    }"#;

    #[test]
    fn test_shipment_deserialize_camel_case() {
        let shipment: Shipment = serde_json::from_str(SHIPMENT_JSON).unwrap();
        assert_eq!(shipment.id, ShipmentId::new(12));
        assert_eq!(shipment.status, ShipmentStatus::InTransit);
        assert_eq!(shipment.tracking_number.as_str(), "QX81ZK2A");
        assert_eq!(shipment.carrier.as_deref(), Some("UPS"));
        assert_eq!(shipment.effective_priority(), Priority::High);
    }

    #[test]
    fn test_missing_priority_defaults_to_low() {
        let json = r#"{
            "id": 1,
            "origin": "NYC",
            "destination": "LA",
            "status": "PENDING",
            "trackingNumber": "ABC",
            "lastUpdatedTime": "2025-03-04T10:15:30Z"
        }"#;
        let shipment: Shipment = serde_json::from_str(json).unwrap();
        assert_eq!(shipment.priority, None);
        assert_eq!(shipment.carrier, None);
        assert_eq!(shipment.effective_priority(), Priority::Low);
    }

    #[test]
    fn test_generated_tracking_number_shape() {
        let tracking = TrackingNumber::generate();
        assert_eq!(tracking.as_str().len(), TrackingNumber::GENERATED_LENGTH);
        assert!(
            tracking
                .as_str()
                .chars()
                .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        );
    }

    #[test]
    fn test_new_shipment_defaults() {
        let new = NewShipment::new("NYC", "LA");
        assert_eq!(new.status, ShipmentStatus::Pending);
        assert_eq!(new.priority, Some(Priority::Low));
        assert!(!new.tracking_number.is_blank());
        assert!(new.validate().is_ok());

        let json = serde_json::to_value(&new).unwrap();
        assert_eq!(json["origin"], "NYC");
        assert_eq!(json["status"], "PENDING");
        assert!(json.get("id").is_none());
        assert!(json.get("lastUpdatedTime").is_none());
        assert!(json.get("carrier").is_none());
    }

    #[test]
    fn test_new_shipment_blank_carrier_dropped() {
        let new = NewShipment::new("NYC", "LA").with_carrier("  ");
        assert_eq!(new.carrier, None);
        let new = new.with_carrier("FedEx");
        assert_eq!(new.carrier.as_deref(), Some("FedEx"));
    }

    #[test]
    fn test_new_shipment_validation() {
        assert_eq!(
            NewShipment::new(" ", "LA").validate(),
            Err(ShipmentError::EmptyField("origin"))
        );
        assert_eq!(
            NewShipment::new("NYC", "").validate(),
            Err(ShipmentError::EmptyField("destination"))
        );

        let mut new = NewShipment::new("NYC", "LA");
        new.tracking_number = TrackingNumber::new("");
        assert!(new.validate().is_err());
        new.ensure_tracking_number();
        assert!(new.validate().is_ok());
    }

    #[test]
    fn test_patch_serializes_only_supplied_fields() {
        let patch = ShipmentPatch {
            status: Some(ShipmentStatus::Delivered),
            ..ShipmentPatch::default()
        };
        let json = serde_json::to_string(&patch).unwrap();
        assert_eq!(json, r#"{"status":"DELIVERED"}"#);
    }

    #[test]
    fn test_patch_validation() {
        assert_eq!(
            ShipmentPatch::default().validate(),
            Err(ShipmentError::EmptyPatch)
        );
        let patch = ShipmentPatch {
            origin: Some(String::new()),
            ..ShipmentPatch::default()
        };
        assert_eq!(patch.validate(), Err(ShipmentError::EmptyField("origin")));
    }

    #[test]
    fn test_with_status_keeps_other_fields() {
        let shipment: Shipment = serde_json::from_str(SHIPMENT_JSON).unwrap();
        let now = Utc::now();
        let updated = shipment.with_status(ShipmentStatus::Delivered, now);
        assert_eq!(updated.status, ShipmentStatus::Delivered);
        assert_eq!(updated.last_updated_time, now);
        assert_eq!(updated.origin, shipment.origin);
        assert_eq!(updated.tracking_number, shipment.tracking_number);
    }

    #[test]
    fn test_update_message_deserialize() {
        let json = r#"{
            "shipmentId": 3,
            "trackingNumber": "ZZ1",
            "status": "DELIVERED",
            "lastUpdatedTime": "2025-03-04T10:15:30"
        }"#;
        let message: ShipmentUpdateMessage = serde_json::from_str(json).unwrap();
        assert_eq!(message.shipment_id, ShipmentId::new(3));
        assert_eq!(message.status, ShipmentStatus::Delivered);
    }
}

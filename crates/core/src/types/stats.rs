//! Aggregate shipment statistics computed server-side.

use serde::{Deserialize, Serialize};

use super::status::ShipmentStatus;

/// Per-status shipment counts.
///
/// All four statuses are always present; statuses missing from the wire
/// payload decode as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "PENDING", default)]
    pub pending: u64,
    #[serde(rename = "IN_TRANSIT", default)]
    pub in_transit: u64,
    #[serde(rename = "DELIVERED", default)]
    pub delivered: u64,
    #[serde(rename = "CANCELLED", default)]
    pub cancelled: u64,
}

impl StatusCounts {
    /// Count for a single status.
    #[must_use]
    pub const fn get(&self, status: ShipmentStatus) -> u64 {
        match status {
            ShipmentStatus::Pending => self.pending,
            ShipmentStatus::InTransit => self.in_transit,
            ShipmentStatus::Delivered => self.delivered,
            ShipmentStatus::Cancelled => self.cancelled,
        }
    }

    /// `(status, count)` pairs in lifecycle order.
    pub fn iter(&self) -> impl Iterator<Item = (ShipmentStatus, u64)> + '_ {
        ShipmentStatus::ALL
            .into_iter()
            .map(move |status| (status, self.get(status)))
    }

    /// Sum over every status.
    #[must_use]
    pub const fn sum(&self) -> u64 {
        self.pending + self.in_transit + self.delivered + self.cancelled
    }
}

/// Read-only aggregate snapshot, replaced wholesale on each fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShipmentStats {
    #[serde(default)]
    pub total_shipments: u64,
    #[serde(default)]
    pub status_counts: StatusCounts,
    /// `None` when there are no shipments.
    #[serde(default)]
    pub most_common_origin: Option<String>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_statuses_are_zero() {
        let json = r#"{
            "totalShipments": 4,
            "statusCounts": {"PENDING": 3, "DELIVERED": 1},
            "mostCommonOrigin": "Chicago"
        }"#;
        let stats: ShipmentStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats.total_shipments, 4);
        assert_eq!(stats.status_counts.get(ShipmentStatus::Pending), 3);
        assert_eq!(stats.status_counts.get(ShipmentStatus::InTransit), 0);
        assert_eq!(stats.status_counts.get(ShipmentStatus::Cancelled), 0);
        assert_eq!(stats.status_counts.sum(), 4);
        assert_eq!(stats.most_common_origin.as_deref(), Some("Chicago"));
    }

    #[test]
    fn test_empty_stats() {
        let json = r#"{"totalShipments": 0, "statusCounts": {}, "mostCommonOrigin": null}"#;
        let stats: ShipmentStats = serde_json::from_str(json).unwrap();
        assert_eq!(stats, ShipmentStats::default());
        assert_eq!(stats.status_counts.iter().count(), 4);
    }

    #[test]
    fn test_serialize_lists_every_status() {
        let json = serde_json::to_value(StatusCounts::default()).unwrap();
        for status in ShipmentStatus::ALL {
            assert_eq!(json[status.as_str()], 0);
        }
    }
}

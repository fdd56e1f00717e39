//! Gateway calls reconciled into the store.
//!
//! Every mutating operation performs one API call and, only when it succeeds,
//! applies the result to the [`ShipmentStore`]. A failed or dropped call leaves
//! the store untouched. Search and stats are read-through and never touch it.

use std::sync::Arc;

use freight_tracker_core::{NewShipment, Page, Shipment, ShipmentId, ShipmentPatch, ShipmentStats};
use tracing::{info, instrument};

use crate::api::{ApiError, SearchQuery, ShipmentApiClient};
use crate::store::ShipmentStore;

#[derive(Debug, Clone)]
pub struct ShipmentSync {
    api: ShipmentApiClient,
    store: Arc<ShipmentStore>,
}

impl ShipmentSync {
    #[must_use]
    pub const fn new(api: ShipmentApiClient, store: Arc<ShipmentStore>) -> Self {
        Self { api, store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ShipmentStore> {
        &self.store
    }

    /// Replace the store with every remote shipment.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; the store keeps its previous content.
    #[instrument(skip(self))]
    pub async fn load_all(&self) -> Result<usize, ApiError> {
        let shipments = self.api.fetch_all().await?;
        let count = shipments.len();
        self.store.bulk_load(shipments);
        info!(count, "Loaded shipments");
        Ok(count)
    }

    /// Load everything unless the store already holds records.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error.
    pub async fn ensure_loaded(&self) -> Result<(), ApiError> {
        if self.store.is_empty() {
            self.load_all().await?;
        }
        Ok(())
    }

    /// Search the remote collection. The page goes to the caller only.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Shipment>, ApiError> {
        self.api.search(query).await
    }

    /// Create a shipment, generating a tracking number when blank.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error.
    #[instrument(skip(self, shipment))]
    pub async fn create(&self, mut shipment: NewShipment) -> Result<Shipment, ApiError> {
        shipment.ensure_tracking_number();
        let created = self.api.create(&shipment).await?;
        self.store.upsert(created.clone());
        info!(
            shipment_id = %created.id,
            tracking_number = %created.tracking_number,
            "Shipment created"
        );
        Ok(created)
    }

    /// Fetch one shipment and refresh its store entry.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` when the shipment does not exist.
    pub async fn refresh(&self, id: ShipmentId) -> Result<Shipment, ApiError> {
        let shipment = self.api.fetch_one(id).await?;
        self.store.upsert(shipment.clone());
        Ok(shipment)
    }

    /// Update a shipment and store the server's result.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error.
    #[instrument(skip(self, patch))]
    pub async fn update(
        &self,
        id: ShipmentId,
        patch: &ShipmentPatch,
    ) -> Result<Shipment, ApiError> {
        let updated = self.api.update(id, patch).await?;
        self.store.upsert(updated.clone());
        Ok(updated)
    }

    /// Delete a shipment and drop its store entry.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error; the entry stays in the store.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: ShipmentId) -> Result<(), ApiError> {
        self.api.delete(id).await?;
        self.store.remove(id);
        info!(shipment_id = %id, "Shipment deleted");
        Ok(())
    }

    /// Aggregate statistics. Does not touch the store.
    ///
    /// # Errors
    ///
    /// Propagates the gateway error.
    pub async fn stats(&self) -> Result<ShipmentStats, ApiError> {
        self.api.stats().await
    }
}

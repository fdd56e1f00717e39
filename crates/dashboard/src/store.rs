//! In-memory shipment state.
//!
//! The store is the single source of truth for the dashboard: REST results
//! (through [`crate::sync::ShipmentSync`]) and push notifications (through
//! [`crate::realtime::NotificationChannel`]) both land here. Records are held
//! as `Arc<Shipment>` so untouched entries keep their identity across
//! mutations and snapshots are cheap to clone.
//!
//! Observers either watch the whole map ([`ShipmentStore::watch`]) or follow
//! per-record events ([`ShipmentStore::subscribe`]).

use std::collections::HashMap;
use std::sync::Arc;

use freight_tracker_core::{Shipment, ShipmentId, ShipmentUpdateMessage};
use tokio::sync::{broadcast, watch};
use tracing::debug;

/// The canonical collection, keyed by shipment id.
pub type ShipmentMap = HashMap<ShipmentId, Arc<Shipment>>;

const EVENT_CAPACITY: usize = 256;

/// A change applied to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreEvent {
    /// The collection was replaced by a bulk load.
    Replaced { count: usize },
    /// A record was inserted or overwritten.
    Upserted(ShipmentId),
    /// A record was deleted.
    Removed(ShipmentId),
    /// The collection was emptied.
    Cleared,
}

/// Shared shipment collection.
///
/// Every mutation is atomic with respect to readers. No ordering is enforced
/// between independent writers; the last write for an id wins.
#[derive(Debug)]
pub struct ShipmentStore {
    state: watch::Sender<ShipmentMap>,
    events: broadcast::Sender<StoreEvent>,
}

impl Default for ShipmentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ShipmentStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(ShipmentMap::new());
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self { state, events }
    }

    /// Replace the whole collection. Later duplicates of an id win.
    pub fn bulk_load(&self, records: impl IntoIterator<Item = Shipment>) {
        let map: ShipmentMap = records
            .into_iter()
            .map(|record| (record.id, Arc::new(record)))
            .collect();
        let count = map.len();
        self.state.send_replace(map);
        debug!(count, "Store replaced");
        self.emit(StoreEvent::Replaced { count });
    }

    /// Insert or overwrite a record.
    pub fn upsert(&self, record: Shipment) {
        let id = record.id;
        self.state.send_modify(|map| {
            map.insert(id, Arc::new(record));
        });
        self.emit(StoreEvent::Upserted(id));
    }

    /// Insert or overwrite unless the stored record is strictly newer.
    ///
    /// Returns whether the record was written.
    pub fn upsert_if_newer(&self, record: Shipment) -> bool {
        let id = record.id;
        let written = self.state.send_if_modified(|map| match map.get(&id) {
            Some(current) if current.last_updated_time > record.last_updated_time => false,
            _ => {
                map.insert(id, Arc::new(record));
                true
            }
        });
        if written {
            self.emit(StoreEvent::Upserted(id));
        } else {
            debug!(shipment_id = %id, "Ignored stale record");
        }
        written
    }

    /// Apply a status change to a known record.
    ///
    /// Returns `false` when the id is not in the store.
    pub fn apply_status_update(&self, message: &ShipmentUpdateMessage) -> bool {
        let id = message.shipment_id;
        let applied = self.state.send_if_modified(|map| {
            let Some(current) = map.get(&id) else {
                return false;
            };
            let updated = current.with_status(message.status, message.last_updated_time);
            map.insert(id, Arc::new(updated));
            true
        });
        if applied {
            self.emit(StoreEvent::Upserted(id));
        }
        applied
    }

    /// Delete a record. Removing an absent id is a no-op.
    ///
    /// Returns whether anything was removed.
    pub fn remove(&self, id: ShipmentId) -> bool {
        let removed = self.state.send_if_modified(|map| map.remove(&id).is_some());
        if removed {
            self.emit(StoreEvent::Removed(id));
        }
        removed
    }

    /// Empty the collection.
    pub fn clear(&self) {
        self.state.send_modify(HashMap::clear);
        self.emit(StoreEvent::Cleared);
    }

    /// Look up a record.
    #[must_use]
    pub fn get(&self, id: ShipmentId) -> Option<Arc<Shipment>> {
        self.state.borrow().get(&id).cloned()
    }

    /// Clone the current collection.
    #[must_use]
    pub fn snapshot(&self) -> ShipmentMap {
        self.state.borrow().clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().is_empty()
    }

    /// Records ordered by most recent update, ties broken by id.
    #[must_use]
    pub fn list_sorted(&self) -> Vec<Arc<Shipment>> {
        let mut records: Vec<_> = self.state.borrow().values().cloned().collect();
        records.sort_by(|a, b| {
            b.last_updated_time
                .cmp(&a.last_updated_time)
                .then_with(|| a.id.cmp(&b.id))
        });
        records
    }

    /// Whole-collection signal, marked changed on every mutation.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<ShipmentMap> {
        self.state.subscribe()
    }

    /// Fine-grained change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

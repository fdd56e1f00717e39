//! Live view of pushed shipment changes.
//!
//! Connects the notification channel to a local store and prints one JSON
//! line per store change until Ctrl+C.
//!
//! # Environment Variables
//!
//! - `FREIGHT_WS_URL` - STOMP WebSocket endpoint
//! - `FREIGHT_WS_TOPIC` - Topic to subscribe to
//! - `FREIGHT_API_URL` - Only with `--load`

use std::sync::Arc;

use freight_tracker_dashboard::api::ShipmentApiClient;
use freight_tracker_dashboard::config::{ApiConfig, RealtimeConfig};
use freight_tracker_dashboard::realtime::NotificationChannel;
use freight_tracker_dashboard::store::{ShipmentStore, StoreEvent};
use serde_json::json;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::{CommandError, print_json_line};

/// Follow the push channel until interrupted.
///
/// # Errors
///
/// Returns an error if configuration is malformed or the initial load fails.
pub async fn run(load: bool) -> Result<(), CommandError> {
    let realtime = RealtimeConfig::from_env()?;
    let store = Arc::new(ShipmentStore::new());

    if load {
        let client = ShipmentApiClient::new(&ApiConfig::from_env()?)?;
        store.bulk_load(client.fetch_all().await?);
        info!(count = store.len(), "Loaded shipments");
    }

    let mut events = store.subscribe();
    let channel = NotificationChannel::new(realtime, Arc::clone(&store));
    let mut state = channel.watch_state();
    channel.connect().await;

    let result = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break Ok(()),
            Ok(()) = state.changed() => {
                let current = *state.borrow_and_update();
                info!(state = %current, "Channel state changed");
            }
            event = events.recv() => match event {
                Ok(event) => {
                    if let Err(e) = print_json_line(&event_json(&store, event)) {
                        break Err(e);
                    }
                }
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "Missed store events"),
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    channel.disconnect().await;
    result
}

fn event_json(store: &ShipmentStore, event: StoreEvent) -> serde_json::Value {
    match event {
        StoreEvent::Upserted(id) => json!({
            "event": "upserted",
            "id": id,
            "shipment": store.get(id).as_deref(),
        }),
        StoreEvent::Removed(id) => json!({ "event": "removed", "id": id }),
        StoreEvent::Replaced { count } => json!({ "event": "replaced", "count": count }),
        StoreEvent::Cleared => json!({ "event": "cleared" }),
    }
}

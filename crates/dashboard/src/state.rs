//! Application state shared across handlers.

use std::sync::Arc;

use thiserror::Error;

use crate::api::{ApiError, ShipmentApiClient};
use crate::config::DashboardConfig;
use crate::geocode::{GeocodeError, Geocoder};
use crate::realtime::NotificationChannel;
use crate::store::ShipmentStore;
use crate::sync::ShipmentSync;

/// Error building the application state.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("shipment API client: {0}")]
    Api(#[from] ApiError),
    #[error("geocoder: {0}")]
    Geocode(#[from] GeocodeError),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. The store is created here and
/// injected into both the sync service and the push channel.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: DashboardConfig,
    store: Arc<ShipmentStore>,
    sync: ShipmentSync,
    geocoder: Geocoder,
    channel: NotificationChannel,
}

impl AppState {
    /// Wire the store, gateway, geocoder and push channel together.
    ///
    /// Nothing connects yet; call [`NotificationChannel::connect`] and
    /// [`ShipmentSync::load_all`] to start.
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built.
    pub async fn new(config: DashboardConfig) -> Result<Self, StateError> {
        let store = Arc::new(ShipmentStore::new());
        let api = ShipmentApiClient::new(&config.api)?;
        let sync = ShipmentSync::new(api, Arc::clone(&store));
        let geocoder = Geocoder::open(&config.geocode).await?;
        let channel = NotificationChannel::new(config.realtime.clone(), Arc::clone(&store));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                sync,
                geocoder,
                channel,
            }),
        })
    }

    #[must_use]
    pub fn config(&self) -> &DashboardConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn store(&self) -> &Arc<ShipmentStore> {
        &self.inner.store
    }

    #[must_use]
    pub fn sync(&self) -> &ShipmentSync {
        &self.inner.sync
    }

    #[must_use]
    pub fn geocoder(&self) -> &Geocoder {
        &self.inner.geocoder
    }

    #[must_use]
    pub fn channel(&self) -> &NotificationChannel {
        &self.inner.channel
    }
}

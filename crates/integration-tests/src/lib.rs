//! Integration tests for Freight Tracker.
//!
//! Every test runs against in-process fakes bound to `127.0.0.1:0`, so no
//! external service or network access is needed:
//!
//! - [`FakeApi`]: the remote shipment REST service
//! - [`FakeGeocoder`]: a Nominatim-style search endpoint
//! - [`FakeBroker`]: a STOMP-over-WebSocket broker that can push messages
//!   and drop its connections
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freight-tracker-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

mod api;
mod broker;
mod geocoder;

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use freight_tracker_core::{NewShipment, Priority, ShipmentStatus};

pub use api::FakeApi;
pub use broker::FakeBroker;
pub use geocoder::{CHICAGO, FakeGeocoder};

/// Upper bound for any wait in the tests.
pub const WAIT: Duration = Duration::from_secs(5);

/// A unique temporary file path for a geocode cache.
#[must_use]
pub fn temp_cache_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "freight-it-{name}-{}-{}.json",
        std::process::id(),
        rand::random::<u32>()
    ))
}

/// A new shipment between two places with a fixed status.
#[must_use]
pub fn new_shipment(origin: &str, destination: &str, status: ShipmentStatus) -> NewShipment {
    NewShipment::new(origin, destination)
        .with_status(status)
        .with_priority(Priority::Medium)
}

/// Poll `condition` until it holds or [`WAIT`] elapses.
pub async fn eventually<F>(mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    tokio::time::timeout(WAIT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .is_ok()
}

/// Await `future` for at most [`WAIT`].
pub async fn within<T>(future: impl Future<Output = T>) -> Option<T> {
    tokio::time::timeout(WAIT, future).await.ok()
}

/// Bind a listener on an ephemeral local port.
async fn bind() -> std::io::Result<tokio::net::TcpListener> {
    tokio::net::TcpListener::bind(("127.0.0.1", 0)).await
}

/// Serve `router` on an ephemeral port until the runtime shuts down.
async fn serve(router: axum::Router) -> std::io::Result<std::net::SocketAddr> {
    let listener = bind().await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok(addr)
}

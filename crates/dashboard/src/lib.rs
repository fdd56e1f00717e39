//! Freight Tracker Dashboard library.
//!
//! The shipment synchronization core behind the dashboard:
//!
//! - [`store::ShipmentStore`]: the single in-memory collection of shipments
//! - [`api::ShipmentApiClient`]: the remote REST gateway
//! - [`sync::ShipmentSync`]: gateway calls reconciled into the store
//! - [`realtime::NotificationChannel`]: STOMP push subscription feeding the store
//! - [`geocode::Geocoder`]: place name lookups with a persisted cache
//! - [`map`]: route projection for the map view
//!
//! The binary exposes these over a JSON HTTP surface (see [`routes`]).

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod geocode;
pub mod map;
pub mod realtime;
pub mod routes;
pub mod state;
pub mod store;
pub mod sync;

use axum::Router;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::state::AppState;

/// The dashboard router with tracing and Sentry middleware applied.
pub fn app(state: AppState) -> Router {
    routes::routes()
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}

//! Freight Tracker Core - Shared types library.
//!
//! This crate provides the types used across all Freight Tracker components:
//! - `dashboard` - Store, remote gateway, push channel and geocode cache
//! - `cli` - Command-line access to the remote shipment API
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no runtime.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Shipment records, request bodies, statistics, pages and coordinates

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Subcommand implementations.

pub mod geocode;
pub mod shipments;
pub mod watch;

use freight_tracker_dashboard::api::ApiError;
use freight_tracker_dashboard::config::ConfigError;
use freight_tracker_dashboard::geocode::GeocodeError;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur while running a command.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Environment configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The shipment service rejected or failed the call.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The geocode cache could not be opened.
    #[error("Geocode error: {0}")]
    Geocode(#[from] GeocodeError),

    /// Output could not be encoded.
    #[error("Output error: {0}")]
    Output(#[from] serde_json::Error),
}

/// Print `value` as pretty JSON on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print `value` as a single JSON line on stdout.
#[allow(clippy::print_stdout)]
pub fn print_json_line<T: Serialize + ?Sized>(value: &T) -> Result<(), CommandError> {
    println!("{}", serde_json::to_string(value)?);
    Ok(())
}

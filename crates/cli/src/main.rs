//! Freight Tracker CLI
//!
//! Command-line tools for the shipment service: CRUD, search, statistics,
//! geocoding and a live view of pushed updates.
//!
//! Every command prints JSON on stdout; logs go to stderr.
//!
//! # Usage
//!
//! ```bash
//! # List every shipment
//! ft-cli list
//!
//! # Create a shipment
//! ft-cli create --origin "New York" --destination "Los Angeles" --priority high
//!
//! # Mark a shipment delivered
//! ft-cli update 42 --status delivered
//!
//! # Search delivered shipments, first page
//! ft-cli search --status delivered --page 0 --size 10
//!
//! # Resolve a place name through the geocode cache
//! ft-cli geocode Chicago
//!
//! # Follow pushed updates until Ctrl+C
//! ft-cli watch --load
//! ```
//!
//! # Environment
//!
//! - `FREIGHT_API_URL` (required for shipment commands)
//! - `FREIGHT_API_TOKEN`, `FREIGHT_WS_URL`, `FREIGHT_WS_TOPIC`,
//!   `FREIGHT_GEOCODE_URL`, `FREIGHT_GEOCODE_CACHE_PATH` (optional)

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use freight_tracker_core::{Priority, ShipmentId, ShipmentStatus};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "ft-cli")]
#[command(author, version, about = "Freight Tracker CLI tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every shipment, most recently updated first
    List,

    /// Fetch one shipment
    Get {
        /// Shipment ID
        id: ShipmentId,
    },

    /// Create a shipment
    Create {
        /// Origin place name
        #[arg(long)]
        origin: String,

        /// Destination place name
        #[arg(long)]
        destination: String,

        /// Initial status (pending, in-transit, delivered, cancelled)
        #[arg(long)]
        status: Option<ShipmentStatus>,

        /// Priority (low, medium, high)
        #[arg(long)]
        priority: Option<Priority>,

        /// Carrier name
        #[arg(long)]
        carrier: Option<String>,
    },

    /// Update fields of a shipment
    Update {
        /// Shipment ID
        id: ShipmentId,

        /// New origin
        #[arg(long)]
        origin: Option<String>,

        /// New destination
        #[arg(long)]
        destination: Option<String>,

        /// New status
        #[arg(long)]
        status: Option<ShipmentStatus>,

        /// New priority
        #[arg(long)]
        priority: Option<Priority>,

        /// New carrier
        #[arg(long)]
        carrier: Option<String>,
    },

    /// Delete a shipment
    Delete {
        /// Shipment ID
        id: ShipmentId,
    },

    /// Search shipments by origin and status
    Search {
        /// Origin filter
        #[arg(long)]
        origin: Option<String>,

        /// Status filter
        #[arg(long)]
        status: Option<ShipmentStatus>,

        /// Zero-based page index
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size
        #[arg(long, default_value = "10")]
        size: u32,
    },

    /// Show aggregate statistics
    Stats,

    /// Resolve a place name to coordinates
    Geocode {
        /// Place name
        place: String,
    },

    /// Connect to the push channel and print store changes until Ctrl+C
    Watch {
        /// Load every shipment from the API before connecting
        #[arg(long)]
        load: bool,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // stdout carries command output
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "freight_tracker_cli=info,freight_tracker_dashboard=info".into()
        }))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::List => commands::shipments::list().await?,
        Commands::Get { id } => commands::shipments::get(id).await?,
        Commands::Create {
            origin,
            destination,
            status,
            priority,
            carrier,
        } => {
            let args = commands::shipments::CreateArgs {
                origin,
                destination,
                status,
                priority,
                carrier,
            };
            commands::shipments::create(args).await?;
        }
        Commands::Update {
            id,
            origin,
            destination,
            status,
            priority,
            carrier,
        } => {
            let patch = freight_tracker_core::ShipmentPatch {
                origin,
                destination,
                status,
                carrier,
                priority,
            };
            commands::shipments::update(id, patch).await?;
        }
        Commands::Delete { id } => commands::shipments::delete(id).await?,
        Commands::Search {
            origin,
            status,
            page,
            size,
        } => {
            let mut query =
                freight_tracker_dashboard::api::SearchQuery::default().with_page(page, size);
            query.origin = origin;
            query.status = status;
            commands::shipments::search(&query).await?;
        }
        Commands::Stats => commands::shipments::stats().await?,
        Commands::Geocode { place } => commands::geocode::resolve(&place).await?,
        Commands::Watch { load } => commands::watch::run(load).await?,
    }

    Ok(())
}

//! Fake of the remote shipment REST service.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use freight_tracker_core::{
    NewShipment, Page, PageMetadata, Shipment, ShipmentId, ShipmentPatch, ShipmentStats,
    StatusCounts,
};
use freight_tracker_dashboard::api::SearchQuery;
use freight_tracker_dashboard::config::{ApiConfig, ConfigError};

#[derive(Debug, Default)]
struct Records {
    shipments: Vec<Shipment>,
    last_id: i64,
}

impl Records {
    fn insert(&mut self, new: NewShipment) -> Shipment {
        self.last_id += 1;
        let shipment = Shipment {
            id: ShipmentId::new(self.last_id),
            origin: new.origin,
            destination: new.destination,
            status: new.status,
            tracking_number: new.tracking_number,
            carrier: new.carrier,
            priority: new.priority,
            last_updated_time: chrono::Utc::now(),
        };
        self.shipments.push(shipment.clone());
        shipment
    }

    fn find_mut(&mut self, id: i64) -> Option<&mut Shipment> {
        self.shipments.iter_mut().find(|s| s.id.as_i64() == id)
    }
}

#[derive(Debug, Clone, Default)]
struct Shared {
    records: Arc<Mutex<Records>>,
    requests: Arc<AtomicUsize>,
}

impl Shared {
    fn records(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn hit(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// In-memory shipment service mounted under `/api`.
///
/// Ids are assigned sequentially from 1 and every write stamps the current
/// time, like the real service.
#[derive(Debug, Clone)]
pub struct FakeApi {
    addr: SocketAddr,
    shared: Shared,
}

impl FakeApi {
    /// Start the service on an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let shared = Shared::default();
        let router = Router::new()
            .route("/api/shipments", get(list).post(create))
            .route("/api/shipments/search", get(search))
            .route("/api/shipments/stats", get(stats))
            .route(
                "/api/shipments/{id}",
                get(show).put(update).delete(remove),
            )
            .with_state(shared.clone());
        let addr = super::serve(router).await?;
        Ok(Self { addr, shared })
    }

    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this service.
    ///
    /// # Errors
    ///
    /// Never fails for a bound address.
    pub fn config(&self) -> Result<ApiConfig, ConfigError> {
        ApiConfig::new(&self.base_url())
    }

    /// Insert a record directly, bypassing HTTP.
    pub fn seed(&self, new: NewShipment) -> Shipment {
        self.shared.records().insert(new)
    }

    /// Current server-side records.
    #[must_use]
    pub fn shipments(&self) -> Vec<Shipment> {
        self.shared.records().shipments.clone()
    }

    /// Requests served so far.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.shared.requests.load(Ordering::SeqCst)
    }
}

async fn list(State(shared): State<Shared>) -> Json<Vec<Shipment>> {
    shared.hit();
    Json(shared.records().shipments.clone())
}

async fn create(
    State(shared): State<Shared>,
    Json(new): Json<NewShipment>,
) -> Result<(StatusCode, Json<Shipment>), StatusCode> {
    shared.hit();
    if new.validate().is_err() {
        return Err(StatusCode::BAD_REQUEST);
    }
    let created = shared.records().insert(new);
    Ok((StatusCode::CREATED, Json(created)))
}

async fn show(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
) -> Result<Json<Shipment>, StatusCode> {
    shared.hit();
    shared
        .records()
        .find_mut(id)
        .map(|s| Json(s.clone()))
        .ok_or(StatusCode::NOT_FOUND)
}

async fn update(
    State(shared): State<Shared>,
    Path(id): Path<i64>,
    Json(patch): Json<ShipmentPatch>,
) -> Result<Json<Shipment>, StatusCode> {
    shared.hit();
    let mut records = shared.records();
    let shipment = records.find_mut(id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(origin) = patch.origin {
        shipment.origin = origin;
    }
    if let Some(destination) = patch.destination {
        shipment.destination = destination;
    }
    if let Some(status) = patch.status {
        shipment.status = status;
    }
    if let Some(carrier) = patch.carrier {
        shipment.carrier = Some(carrier);
    }
    if let Some(priority) = patch.priority {
        shipment.priority = Some(priority);
    }
    shipment.last_updated_time = chrono::Utc::now();
    Ok(Json(shipment.clone()))
}

async fn remove(State(shared): State<Shared>, Path(id): Path<i64>) -> StatusCode {
    shared.hit();
    let mut records = shared.records();
    let before = records.shipments.len();
    records.shipments.retain(|s| s.id.as_i64() != id);
    if records.shipments.len() == before {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::NO_CONTENT
    }
}

/// Case-insensitive origin substring and exact status match.
async fn search(
    State(shared): State<Shared>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Page<Shipment>>, StatusCode> {
    shared.hit();
    if query.size == 0 {
        return Err(StatusCode::BAD_REQUEST);
    }

    let origin = query.origin_filter().map(str::to_lowercase);
    let matches: Vec<Shipment> = shared
        .records()
        .shipments
        .iter()
        .filter(|s| {
            origin
                .as_deref()
                .is_none_or(|o| s.origin.to_lowercase().contains(o))
        })
        .filter(|s| query.status.is_none_or(|status| s.status == status))
        .cloned()
        .collect();

    let size = query.size as usize;
    let total = matches.len();
    let content = matches
        .into_iter()
        .skip(query.page as usize * size)
        .take(size)
        .collect();

    Ok(Json(Page {
        content,
        page: PageMetadata {
            number: query.page,
            size: query.size,
            total_elements: total as u64,
            total_pages: u32::try_from(total.div_ceil(size)).unwrap_or(u32::MAX),
        },
    }))
}

async fn stats(State(shared): State<Shared>) -> Json<ShipmentStats> {
    shared.hit();
    let records = shared.records();

    let mut counts = StatusCounts::default();
    let mut origins: HashMap<&str, usize> = HashMap::new();
    for shipment in &records.shipments {
        match shipment.status {
            freight_tracker_core::ShipmentStatus::Pending => counts.pending += 1,
            freight_tracker_core::ShipmentStatus::InTransit => counts.in_transit += 1,
            freight_tracker_core::ShipmentStatus::Delivered => counts.delivered += 1,
            freight_tracker_core::ShipmentStatus::Cancelled => counts.cancelled += 1,
        }
        *origins.entry(shipment.origin.as_str()).or_default() += 1;
    }
    let most_common_origin = origins
        .into_iter()
        .max_by(|(a, x), (b, y)| x.cmp(y).then_with(|| b.cmp(a)))
        .map(|(origin, _)| origin.to_string());

    Json(ShipmentStats {
        total_shipments: records.shipments.len() as u64,
        status_counts: counts,
        most_common_origin,
    })
}

//! HTTP client for the shipment API.

use std::sync::Arc;

use freight_tracker_core::{
    NewShipment, Page, Shipment, ShipmentId, ShipmentPatch, ShipmentStats,
};
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{RequestBuilder, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use super::{ApiError, SearchQuery};
use crate::config::ApiConfig;

/// Longest error body kept in `ApiError::Status`.
const MAX_ERROR_BODY: usize = 200;

/// Client for the remote shipment REST API.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ShipmentApiClient {
    inner: Arc<ShipmentApiClientInner>,
}

struct ShipmentApiClientInner {
    client: reqwest::Client,
    base_url: Url,
}

impl std::fmt::Debug for ShipmentApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShipmentApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl ShipmentApiClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP
    /// client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &config.token {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
                .map_err(|e| ApiError::InvalidRequest(format!("Invalid API token format: {e}")))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ShipmentApiClientInner {
                client,
                base_url: config.base_url.clone(),
            }),
        })
    }

    /// The configured base URL.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Create a shipment. The server assigns id and update time.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for blank places, otherwise any
    /// transport, status or decode failure.
    #[instrument(skip(self, shipment), fields(tracking_number = %shipment.tracking_number))]
    pub async fn create(&self, shipment: &NewShipment) -> Result<Shipment, ApiError> {
        shipment.validate()?;
        let url = self.url("shipments")?;
        let response = self
            .send(self.inner.client.post(url).json(shipment), None)
            .await?;
        decode(response).await
    }

    /// Fetch every shipment.
    ///
    /// # Errors
    ///
    /// Returns any transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<Shipment>, ApiError> {
        let url = self.url("shipments")?;
        let response = self.send(self.inner.client.get(url), None).await?;
        decode(response).await
    }

    /// Fetch one shipment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` on 404.
    #[instrument(skip(self), fields(shipment_id = %id))]
    pub async fn fetch_one(&self, id: ShipmentId) -> Result<Shipment, ApiError> {
        let url = self.shipment_url(id)?;
        let response = self.send(self.inner.client.get(url), Some(id)).await?;
        decode(response).await
    }

    /// Apply a partial update and return the stored result.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for an empty patch and
    /// `ApiError::NotFound` on 404.
    #[instrument(skip(self, patch), fields(shipment_id = %id))]
    pub async fn update(
        &self,
        id: ShipmentId,
        patch: &ShipmentPatch,
    ) -> Result<Shipment, ApiError> {
        patch.validate()?;
        let url = self.shipment_url(id)?;
        let response = self
            .send(self.inner.client.put(url).json(patch), Some(id))
            .await?;
        decode(response).await
    }

    /// Delete a shipment.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::NotFound` on 404.
    #[instrument(skip(self), fields(shipment_id = %id))]
    pub async fn delete(&self, id: ShipmentId) -> Result<(), ApiError> {
        let url = self.shipment_url(id)?;
        self.send(self.inner.client.delete(url), Some(id)).await?;
        Ok(())
    }

    /// Filtered, paginated search.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for a zero page size, otherwise any
    /// transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &SearchQuery) -> Result<Page<Shipment>, ApiError> {
        query.validate()?;
        let mut url = self.url("shipments/search")?;
        query.apply(&mut url);
        let response = self.send(self.inner.client.get(url), None).await?;
        decode(response).await
    }

    /// Aggregate statistics.
    ///
    /// # Errors
    ///
    /// Returns any transport, status or decode failure.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<ShipmentStats, ApiError> {
        let url = self.url("shipments/stats")?;
        let response = self.send(self.inner.client.get(url), None).await?;
        decode(response).await
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    fn shipment_url(&self, id: ShipmentId) -> Result<Url, ApiError> {
        self.url(&format!("shipments/{id}"))
    }

    /// Send a request and turn non-success statuses into errors.
    ///
    /// A 404 maps to `NotFound` when the request addressed one shipment.
    async fn send(
        &self,
        request: RequestBuilder,
        id: Option<ShipmentId>,
    ) -> Result<Response, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if let (StatusCode::NOT_FOUND, Some(id)) = (status, id) {
            tracing::debug!(shipment_id = %id, "Shipment not found");
            return Err(ApiError::NotFound(id));
        }

        let body = response.text().await.unwrap_or_default();
        let message: String = body.chars().take(MAX_ERROR_BODY).collect();
        tracing::warn!(status = status.as_u16(), message = %message, "Shipment API error");
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(MAX_ERROR_BODY).collect::<String>(),
            "Failed to decode shipment API response"
        );
        ApiError::Parse(e)
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ShipmentApiClient {
        ShipmentApiClient::new(&ApiConfig::new(base).unwrap()).unwrap()
    }

    #[test]
    fn test_urls_stay_under_base_path() {
        let client = client("http://localhost:8080/api");
        assert_eq!(
            client.url("shipments").unwrap().as_str(),
            "http://localhost:8080/api/shipments"
        );
        assert_eq!(
            client.shipment_url(ShipmentId::new(42)).unwrap().as_str(),
            "http://localhost:8080/api/shipments/42"
        );
    }

    #[test]
    fn test_invalid_token_is_rejected() {
        let mut config = ApiConfig::new("http://localhost:8080/api").unwrap();
        config.token = Some(secrecy::SecretString::from("bad\ntoken"));
        assert!(matches!(
            ShipmentApiClient::new(&config),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_requests_fail_before_sending() {
        // Nothing listens on port 9; a request would surface as ApiError::Http.
        let client = client("http://127.0.0.1:9/api");

        let blank = NewShipment::new("", "Los Angeles");
        assert!(matches!(
            client.create(&blank).await,
            Err(ApiError::InvalidRequest(_))
        ));

        let empty = ShipmentPatch::default();
        assert!(matches!(
            client.update(ShipmentId::new(1), &empty).await,
            Err(ApiError::InvalidRequest(_))
        ));

        let zero = SearchQuery::default().with_page(0, 0);
        assert!(matches!(
            client.search(&zero).await,
            Err(ApiError::InvalidRequest(_))
        ));
    }
}

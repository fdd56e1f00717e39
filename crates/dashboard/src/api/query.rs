//! Search filters for `GET /shipments/search`.

use freight_tracker_core::ShipmentStatus;
use serde::{Deserialize, Serialize};
use url::Url;

use super::ApiError;

pub const DEFAULT_PAGE_SIZE: u32 = 10;

const fn default_size() -> u32 {
    DEFAULT_PAGE_SIZE
}

/// Filtered, paginated search.
///
/// Also the query-string shape of the dashboard's own search route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Origin filter; blank means no filter.
    #[serde(default)]
    pub origin: Option<String>,
    #[serde(default)]
    pub status: Option<ShipmentStatus>,
    /// Zero-based page index.
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_size")]
    pub size: u32,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            origin: None,
            status: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl SearchQuery {
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    #[must_use]
    pub const fn with_status(mut self, status: ShipmentStatus) -> Self {
        self.status = Some(status);
        self
    }

    #[must_use]
    pub const fn with_page(mut self, page: u32, size: u32) -> Self {
        self.page = page;
        self.size = size;
        self
    }

    /// Origin filter with blanks treated as absent.
    #[must_use]
    pub fn origin_filter(&self) -> Option<&str> {
        self.origin
            .as_deref()
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
    }

    /// Reject queries the server would refuse.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::InvalidRequest` for a zero page size.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.size == 0 {
            return Err(ApiError::InvalidRequest(
                "page size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Append the query parameters to `url`.
    pub(crate) fn apply(&self, url: &mut Url) {
        let mut pairs = url.query_pairs_mut();
        if let Some(origin) = self.origin_filter() {
            pairs.append_pair("origin", origin);
        }
        if let Some(status) = self.status {
            pairs.append_pair("status", status.as_str());
        }
        pairs.append_pair("page", &self.page.to_string());
        pairs.append_pair("size", &self.size.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn query_string(query: &SearchQuery) -> String {
        let mut url = Url::parse("http://api.test/shipments/search").unwrap();
        query.apply(&mut url);
        url.query().unwrap_or_default().to_string()
    }

    #[test]
    fn test_defaults() {
        let query = SearchQuery::default();
        assert_eq!(query.page, 0);
        assert_eq!(query.size, 10);
        assert_eq!(query_string(&query), "page=0&size=10");
    }

    #[test]
    fn test_blank_origin_is_omitted() {
        let query = SearchQuery::default().with_origin("   ");
        assert_eq!(query_string(&query), "page=0&size=10");
    }

    #[test]
    fn test_all_filters_encoded() {
        let query = SearchQuery::default()
            .with_origin("New York")
            .with_status(ShipmentStatus::Delivered)
            .with_page(2, 25);
        assert_eq!(
            query_string(&query),
            "origin=New+York&status=DELIVERED&page=2&size=25"
        );
    }

    #[test]
    fn test_zero_size_is_rejected() {
        let query = SearchQuery::default().with_page(0, 0);
        assert!(matches!(query.validate(), Err(ApiError::InvalidRequest(_))));
        assert!(SearchQuery::default().validate().is_ok());
    }

    #[test]
    fn test_deserialize_defaults() {
        let query: SearchQuery = serde_json::from_str(r#"{"status":"IN_TRANSIT"}"#).unwrap();
        assert_eq!(query.status, Some(ShipmentStatus::InTransit));
        assert_eq!(query.size, DEFAULT_PAGE_SIZE);
        assert_eq!(query.page, 0);
    }
}

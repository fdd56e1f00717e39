//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::ApiError;

/// Application-level error type for the dashboard.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shipment API operation failed.
    #[error("Shipment API error: {0}")]
    Api(#[from] ApiError),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Api(ApiError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Api(ApiError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            Self::Api(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message safe to show to clients.
    fn public_message(&self) -> String {
        match self {
            Self::Api(ApiError::NotFound(id)) => format!("Shipment {id} not found"),
            Self::Api(ApiError::InvalidRequest(msg)) => msg.clone(),
            Self::Api(_) => "Shipment service error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = serde_json::json!({ "error": self.public_message() });
        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use freight_tracker_core::{ShipmentError, ShipmentId};

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            AppError::from(ApiError::NotFound(ShipmentId::new(3))).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(ApiError::InvalidRequest("size".into())).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(ApiError::Status {
                status: 500,
                message: "boom".into()
            })
            .status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(ApiError::from(ShipmentError::EmptyPatch)).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_remote_details_are_hidden() {
        let err = AppError::from(ApiError::Status {
            status: 500,
            message: "stack trace with secrets".into(),
        });
        assert_eq!(err.public_message(), "Shipment service error");
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::from(ApiError::NotFound(ShipmentId::new(9))).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = AppError::from(ApiError::Status {
            status: 503,
            message: "down".into(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}

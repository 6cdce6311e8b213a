//! # TutorHub Axum Integration
//!
//! This crate exposes the analytics engine over HTTP:
//! - Route mounting for the admin analytics endpoints
//! - An admin guard middleware and extractor
//! - The `{success, data, message, error}` response envelope
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tutorhub_axum::{AdminLayer, StaticTokenAuthenticator, analytics_routes};
//!
//! let app = analytics_routes(api)
//!     .layer(AdminLayer::new(Arc::new(StaticTokenAuthenticator::new(["s3cret"]))));
//! ```

mod extractor;
mod layer;
mod routes;

pub use extractor::{AdminPrincipal, AdminSession};
pub use layer::{AdminAuthenticator, AdminLayer, AdminMiddleware, StaticTokenAuthenticator};
pub use routes::{LimitParams, PeriodParams, analytics_routes};

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tutorhub_core::AnalyticsError;

/// JSON envelope wrapping every response body.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    /// A successful response carrying `data`.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            error: None,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Wrapper for `AnalyticsError` that renders the failure envelope.
#[derive(Debug)]
pub struct ApiError {
    message: String,
    error: AnalyticsError,
}

impl ApiError {
    /// Wraps `error` with a user-facing `message`.
    pub fn new(message: impl Into<String>, error: AnalyticsError) -> Self {
        Self {
            message: message.into(),
            error,
        }
    }

    /// Returns a closure for `map_err` that attaches `message`.
    pub fn context(message: &'static str) -> impl FnOnce(AnalyticsError) -> Self {
        move |error| Self::new(message, error)
    }

    pub fn error(&self) -> &AnalyticsError {
        &self.error
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.error, message = %self.message, "analytics request failed");
        } else {
            tracing::debug!(error = %self.error, status = status.as_u16(), "analytics request rejected");
        }

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            message: Some(self.message),
            error: Some(self.error.to_string()),
        };
        (status, Json(body)).into_response()
    }
}

impl From<AnalyticsError> for ApiError {
    fn from(error: AnalyticsError) -> Self {
        let message = match &error {
            AnalyticsError::Unauthorized => "Authentication required",
            AnalyticsError::Forbidden => "Admin access required",
            _ => "Request failed",
        };
        Self::new(message, error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_envelope_omits_empty_fields() {
        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({"success": true, "data": [1, 2]}));
    }

    #[test]
    fn test_error_status_mapping() {
        assert_eq!(
            ApiError::from(AnalyticsError::Unauthorized).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::from(AnalyticsError::Forbidden).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::new("Failed", AnalyticsError::fetch_failed("Students", "gone")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}

//! # API Error Type
//!
//! What HTTP clients see when a request fails.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Till                                   │
//! │                                                                         │
//! │  Handler                                                                │
//! │    │                                                                    │
//! │    ├── ValidationError (till-core) ──► 400 VALIDATION_ERROR            │
//! │    ├── CheckoutError::NotFound ──────► 404 NOT_FOUND                   │
//! │    ├── CheckoutError::Insufficient ──► 409 INSUFFICIENT_STOCK          │
//! │    ├── StoreError::NotFound ─────────► 404 NOT_FOUND                   │
//! │    ├── StoreError::ForeignKey... ────► 400 VALIDATION_ERROR            │
//! │    └── any other StoreError ─────────► 500 STORE_FAILURE               │
//! │                                                                         │
//! │  Response body:                                                         │
//! │    { "code": "INSUFFICIENT_STOCK",                                      │
//! │      "message": "insufficient stock for product 7: ..." }              │
//! │                                                                         │
//! │  Business-rule rejections stay distinguishable from infrastructure     │
//! │  failures so clients can present actionable messages.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use till_core::ValidationError;
use till_engine::CheckoutError;
use till_store::StoreError;

/// API error serialized to HTTP clients.
///
/// ## Serialization
/// ```json
/// { "code": "NOT_FOUND", "message": "product 42 not found" }
/// ```
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,

    /// HTTP status, not serialized
    #[serde(skip)]
    status: StatusCode,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Not enough stock to fulfill a cart item (409)
    InsufficientStock,

    /// The storage collaborator failed (500)
    StoreFailure,

    /// Anything else (500)
    Internal,
}

impl ApiError {
    fn new(status: StatusCode, code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
            status,
        }
    }

    /// 404 with a NOT_FOUND code.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, ErrorCode::NotFound, message)
    }

    /// 400 with a VALIDATION_ERROR code.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, ErrorCode::ValidationError, message)
    }

    /// 500 with an INTERNAL code.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::Internal,
            message,
        )
    }

    /// The HTTP status this error maps to.
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(code = ?self.code, message = %self.message, "request failed");
        }
        (self.status, Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::NotFound { .. } => ApiError::not_found(err.to_string()),
            StoreError::ForeignKeyViolation { .. } | StoreError::UniqueViolation { .. } => {
                ApiError::validation(err.to_string())
            }
            _ => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::StoreFailure,
                err.to_string(),
            ),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Validation(inner) => inner.into(),
            CheckoutError::NotFound { .. } => ApiError::not_found(err.to_string()),
            CheckoutError::InsufficientStock { .. } => ApiError::new(
                StatusCode::CONFLICT,
                ErrorCode::InsufficientStock,
                err.to_string(),
            ),
            CheckoutError::Store(inner) => inner.into(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insufficient_stock_maps_to_conflict() {
        let err: ApiError = CheckoutError::InsufficientStock {
            product_id: 7,
            available: 4,
            requested: 5,
        }
        .into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "INSUFFICIENT_STOCK");
        assert!(json.get("status").is_none());
    }

    #[test]
    fn test_store_not_found_maps_to_404() {
        let err: ApiError = StoreError::not_found("product", 42).into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let infra: ApiError = StoreError::PoolExhausted.into();
        assert_eq!(infra.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = serde_json::to_value(&infra).unwrap();
        assert_eq!(json["code"], "STORE_FAILURE");
    }

    #[test]
    fn test_checkout_validation_maps_to_400() {
        let err: ApiError = CheckoutError::Validation(ValidationError::Required {
            field: "items".to_string(),
        })
        .into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}

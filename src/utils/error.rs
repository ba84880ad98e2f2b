//! Unified Error Handling
//!
//! Provides application-wide error types and response structures:
//! - [`AppError`] - application error enum
//! - [`AppResponse`] - API response envelope
//!
//! # Error code convention
//!
//! | Prefix | Category | Example |
//! |--------|----------|---------|
//! | E0xxx | request / business errors | E0003 not found |
//! | E1xxx | ledger errors | E1001 insufficient stock |
//! | E9xxx | system errors | E9002 database error |

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::error;

/// Unified API response structure
///
/// ```json
/// {
///   "code": "E0000",
///   "message": "Success",
///   "data": { ... }
/// }
/// ```
#[derive(Debug, Serialize)]
pub struct AppResponse<T> {
    /// Error code (E0000 means success)
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// Structured detail for a single failed batch item
#[derive(Debug, Clone, Serialize)]
pub struct StockShortfall {
    pub product_id: u64,
    pub available: i64,
    pub requested: i64,
}

/// Application-level error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // ========== Business Logic Errors ==========
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Resource already exists: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    // ========== Ledger Errors ==========
    #[error("Insufficient stock for product {}", .0.product_id)]
    InsufficientStock(StockShortfall),

    #[error("Batch validation failed for {} item(s)", .0.len())]
    BatchValidation(Vec<StockShortfall>),

    #[error("Referential integrity violation: {0}")]
    ReferentialIntegrity(String),

    // ========== System Errors ==========
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Invalid request: {0}")]
    Invalid(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match self {
            // Not found (404)
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "E0003", msg, None),

            // Conflict (409)
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "E0004", msg, None),

            // Validation (400)
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "E0002", msg, None),

            // Insufficient stock (422) - carries structured shortfall
            AppError::InsufficientStock(shortfall) => {
                let msg = format!(
                    "Insufficient stock for product {}: available {}, requested {}",
                    shortfall.product_id, shortfall.available, shortfall.requested
                );
                let details = serde_json::to_value(&shortfall).ok();
                (StatusCode::UNPROCESSABLE_ENTITY, "E1001", msg, details)
            }

            // Batch validation (422) - carries every shortfall, none applied
            AppError::BatchValidation(failures) => {
                let msg = format!("Batch rejected: {} item(s) exceed stock", failures.len());
                let details = serde_json::to_value(&failures).ok();
                (StatusCode::UNPROCESSABLE_ENTITY, "E1002", msg, details)
            }

            // Referential integrity (409)
            AppError::ReferentialIntegrity(msg) => (StatusCode::CONFLICT, "E1003", msg, None),

            // Database errors (500)
            AppError::Database(msg) => {
                error!(target: "database", error = %msg, "Database error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9002",
                    "Database error".to_string(),
                    None,
                )
            }

            // Internal errors (500)
            AppError::Internal(msg) => {
                error!(target: "internal", error = %msg, "Internal error occurred");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "E9001",
                    "Internal server error".to_string(),
                    None,
                )
            }

            // Invalid request (400)
            AppError::Invalid(msg) => (StatusCode::BAD_REQUEST, "E0006", msg, None),
        };

        let body = Json(AppResponse::<serde_json::Value> {
            code: code.to_string(),
            message,
            data: details,
        });

        (status, body).into_response()
    }
}

impl From<crate::audit::AuditStorageError> for AppError {
    fn from(err: crate::audit::AuditStorageError) -> Self {
        AppError::Database(err.to_string())
    }
}

/// Result type for API handlers
pub type AppResult<T> = Result<T, AppError>;

// ========== Helper functions ==========

/// Create a successful response
pub fn ok<T: Serialize>(data: T) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: "Success".to_string(),
        data: Some(data),
    })
}

/// Create a successful response with custom message
pub fn ok_with_message<T: Serialize>(data: T, message: impl Into<String>) -> Json<AppResponse<T>> {
    Json(AppResponse {
        code: "E0000".to_string(),
        message: message.into(),
        data: Some(data),
    })
}

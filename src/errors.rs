use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use sea_orm::error::DbErr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JSON body returned for every rejected operation.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// HTTP status category (e.g. "Not Found", "Conflict")
    pub error: String,
    /// Human-readable description of what was rejected and why
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// ISO 8601 timestamp when the error occurred
    pub timestamp: String,
}

/// Error taxonomy for the warehouse core.
///
/// Every variant except `DatabaseError`/`InternalError` is recoverable at the
/// caller: the operation is rejected and the ledger and movement log are left
/// untouched. Storage unavailability is the only fatal class.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbErr),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Insufficient stock: {0}")]
    InsufficientStock(String),

    #[error("Duplicate scan: {0}")]
    DuplicateScan(String),

    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Transfer to same owner: {0}")]
    SameOwner(Uuid),

    #[error("Concurrent modification of stock record {0}")]
    ConcurrentModification(Uuid),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<sea_orm::TransactionError<ServiceError>> for ServiceError {
    fn from(err: sea_orm::TransactionError<ServiceError>) -> Self {
        match err {
            sea_orm::TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
            sea_orm::TransactionError::Transaction(service_err) => service_err,
        }
    }
}

impl ServiceError {
    pub fn db_error(err: DbErr) -> Self {
        ServiceError::DatabaseError(err)
    }

    fn status(&self) -> (StatusCode, &'static str) {
        match self {
            ServiceError::NotFound(_) => (StatusCode::NOT_FOUND, "Not Found"),
            ServiceError::ValidationError(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            ServiceError::SameOwner(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            ServiceError::InsufficientStock(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::DuplicateScan(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::InvalidStateTransition(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::ConcurrentModification(_) => (StatusCode::CONFLICT, "Conflict"),
            ServiceError::DatabaseError(_)
            | ServiceError::EventError(_)
            | ServiceError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let (status, category) = self.status();

        // Do not leak storage internals to API clients.
        let message = match &self {
            ServiceError::DatabaseError(_) => "A storage error occurred".to_string(),
            other => other.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        let body = ErrorResponse {
            error: category.to_string(),
            message,
            details: None,
            timestamp: Utc::now().to_rfc3339(),
        };

        (status, Json(body)).into_response()
    }
}

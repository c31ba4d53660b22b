//! # Service Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Somtam POS                             │
//! │                                                                         │
//! │  somtam-core rule ───── CoreError ──────────────┐                       │
//! │                                                 │                       │
//! │  sqlx ── DbError ──► StoreError ────────────────┼──► ServiceError       │
//! │  MemoryStore ──────► StoreError ────────────────┘        │              │
//! │                                                          ▼              │
//! │                                            ErrorCode + message          │
//! │                                            (what a transport returns)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Codes
//! ```json
//! { "code": "NOT_FOUND", "message": "Order not found: 7f7a..." }
//! ```

use serde::Serialize;
use somtam_core::{CoreError, ValidationError};
use somtam_db::DbError;
use thiserror::Error;
use tracing::error;

// =============================================================================
// Store Error
// =============================================================================

/// Failures reported by a [`Store`](crate::Store) adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A uniqueness rule was violated (order number, second live payment).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The data was refused by an integrity rule (missing category...).
    #[error("Rejected: {0}")]
    Rejected(String),

    /// Anything else: connection, I/O, corrupt rows.
    #[error("Storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

impl From<DbError> for StoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => StoreError::NotFound { entity, id },
            DbError::UniqueViolation { field } => StoreError::Conflict(format!("duplicate {field}")),
            DbError::ForeignKeyViolation { message } => StoreError::Rejected(message),
            DbError::CheckViolation(message) => StoreError::Rejected(message),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// =============================================================================
// Service Error
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Core(CoreError::Validation(err))
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        ServiceError::Store(err.into())
    }
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Machine-readable error codes for transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// State conflict: already paid, already refunded, duplicate (409)
    Conflict,

    /// Business rule refused the operation (422)
    BusinessLogic,

    /// Storage failed (500)
    DatabaseError,
}

impl ErrorCode {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::NotFound => "NOT_FOUND",
            ErrorCode::ValidationError => "VALIDATION_ERROR",
            ErrorCode::Conflict => "CONFLICT",
            ErrorCode::BusinessLogic => "BUSINESS_LOGIC",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
        }
    }

    /// Suggested HTTP status.
    pub const fn http_status(&self) -> u16 {
        match self {
            ErrorCode::NotFound => 404,
            ErrorCode::ValidationError => 400,
            ErrorCode::Conflict => 409,
            ErrorCode::BusinessLogic => 422,
            ErrorCode::DatabaseError => 500,
        }
    }
}

/// What a transport sends back when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
}

impl ServiceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ServiceError::Core(err) => match err {
                CoreError::NotFound { .. } => ErrorCode::NotFound,
                CoreError::InvalidStatus(_)
                | CoreError::UnknownMenuItem(_)
                | CoreError::UnknownAddon(_)
                | CoreError::CartTooLarge { .. }
                | CoreError::Validation(_) => ErrorCode::ValidationError,
                CoreError::AlreadyPaid(_) | CoreError::AlreadyRefunded(_) => ErrorCode::Conflict,
                CoreError::InvalidState { .. }
                | CoreError::OrderCancelled(_)
                | CoreError::InsufficientPayment { .. } => ErrorCode::BusinessLogic,
            },
            ServiceError::Store(err) => match err {
                StoreError::NotFound { .. } => ErrorCode::NotFound,
                StoreError::Conflict(_) => ErrorCode::Conflict,
                StoreError::Rejected(_) => ErrorCode::ValidationError,
                StoreError::Backend(_) => ErrorCode::DatabaseError,
            },
        }
    }

    /// Builds the response body. Backend details are logged, not returned.
    pub fn to_body(&self) -> ErrorBody {
        let code = self.code();
        let message = match self {
            ServiceError::Store(StoreError::Backend(detail)) => {
                error!(detail = %detail, "Storage operation failed");
                "Database operation failed".to_string()
            }
            other => other.to_string(),
        };
        ErrorBody { code, message }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for somtam-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  somtam-core errors (this file)                                        │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  somtam-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  somtam-service errors                                                 │
//! │  └── ServiceError     - What callers see (with an ErrorCode)           │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ServiceError ← StoreError ← DbError│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (order id, menu item id, etc.)
//! 3. Errors are enum variants, never String
//! 4. The kind survives every layer so transports can map it to a status

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// The order is not in a state that allows the requested mutation.
    ///
    /// ## When This Occurs
    /// - Adding or removing a line once the kitchen has started (not pending)
    /// - Moving an order out of `completed` or `cancelled`
    /// - Cancelling a completed order
    #[error("Order {order_id} is {status}, cannot perform operation")]
    InvalidState { order_id: String, status: String },

    /// An unrecognised order status was supplied.
    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    /// The order has already been paid.
    ///
    /// ## When This Occurs
    /// - A second payment attempt on the same order
    /// - Cancelling a paid order (it must be refunded first)
    #[error("Order {0} is already paid")]
    AlreadyPaid(String),

    /// The payment has already been refunded (or never completed).
    #[error("Payment {0} is already refunded")]
    AlreadyRefunded(String),

    /// Payment attempted on a cancelled order.
    #[error("Order {0} is cancelled")]
    OrderCancelled(String),

    /// Cash tendered is below the order total.
    ///
    /// ## User Workflow
    /// ```text
    /// Total: 80.00
    ///      │
    ///      ▼
    /// Customer hands over 70.00
    ///      │
    ///      ▼
    /// InsufficientPayment { required: 80.00, received: 70.00 }
    ///      │
    ///      ▼
    /// UI shows: "Not enough cash"
    /// ```
    #[error("Insufficient payment: required {required}, received {received}")]
    InsufficientPayment { required: Money, received: Money },

    /// A line references a menu item missing from the catalog.
    #[error("Unknown menu item: {0}")]
    UnknownMenuItem(String),

    /// A line references an add-on missing from the catalog
    /// (only raised under `AddonPolicy::Reject`).
    #[error("Unknown add-on: {0}")]
    UnknownAddon(String),

    /// Cart has exceeded maximum allowed entries.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet shape/range requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid percentage).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

//! # somtam-core: Pure Business Logic for Somtam POS
//!
//! This crate is the **heart** of Somtam POS. Everything that has a rule,
//! an invariant or a number in it lives here as a pure function.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Somtam POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Frontend / transport (out of this workspace)         │   │
//! │  │    Menu UI ──► Cart UI ──► Kitchen UI ──► Payment UI ──► Reports │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 somtam-service (orchestration)                  │   │
//! │  │   create_order, add_line, process_payment, refund_payment ...   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ somtam-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │  catalog ─► pricing ─► order (lifecycle) ─► settlement ─► report │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    somtam-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and tax rate with integer arithmetic (no floating point!)
//! - [`types`] - Domain types (MenuItem, Order, Payment, etc.)
//! - [`catalog`] - Read-only lookup over menu items, add-ons and categories
//! - [`pricing`] - Line totals, subtotal, tax, grand total
//! - [`cart`] - Terminal-side cart that merges identical lines
//! - [`filter`] - Order and payment query filters shared by the stores
//! - [`order`] - Order lifecycle state machine
//! - [`settlement`] - Payment, change and refund rules
//! - [`report`] - Dashboard folds over order/payment history
//! - [`receipt`] - Printable receipt data
//! - [`settings`] - Typed shop settings parsed from key-value pairs
//! - [`validation`] - Input validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use somtam_core::money::{Money, TaxRate};
//!
//! // 45.00 at 7% VAT
//! let subtotal = Money::from_major_minor(45, 0);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(700));
//! assert_eq!(tax.cents(), 315);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod filter;
pub mod money;
pub mod order;
pub mod pricing;
pub mod receipt;
pub mod report;
pub mod settings;
pub mod settlement;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use filter::{OrderFilter, PaymentFilter};
pub use money::{Money, TaxRate};
pub use order::CreateOrderRequest;
pub use pricing::{AddonPolicy, LineRequest, PricedOrder, Totals};
pub use report::{DateRange, ReportClock};
pub use settlement::PaymentRequest;
pub use settings::ShopSettings;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum entries allowed in a single cart or order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity on a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 100 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest spice level a dish can be ordered at.
pub const MAX_SPICE_LEVEL: u8 = 5;

/// Tax rate applied when the shop has not configured one (7% VAT).
pub const DEFAULT_TAX_RATE_BPS: u32 = 700;

/// Prefix of human-readable order numbers.
pub const ORDER_NUMBER_PREFIX: &str = "ORD";

//! # Domain Types
//!
//! Core domain types used throughout Somtam POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    MenuItem     │   │      Order      │   │    Payment      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  name           │   │  order_number   │   │  order_id (FK)  │       │
//! │  │  price_cents    │   │  status         │   │  method         │       │
//! │  │  addon_ids      │   │  lines[]        │   │  amount_cents   │       │
//! │  └─────────────────┘   │  total_cents    │   └─────────────────┘       │
//! │                        └─────────────────┘                              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   OrderStatus   │   │  PaymentStatus  │   │ PaymentMethod   │       │
//! │  │  pending        │   │  unpaid         │   │  cash           │       │
//! │  │  preparing      │   │  paid           │   │  promptpay      │       │
//! │  │  ready          │   │  refunded       │   │  credit_card    │       │
//! │  │  completed      │   └─────────────────┘   └─────────────────┘       │
//! │  │  cancelled      │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! An [`OrderLine`] copies the menu item name, unit price and add-on prices
//! at the moment it is created. Later catalog edits never rewrite history.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::CoreError;
use crate::money::Money;

// =============================================================================
// Catalog
// =============================================================================

/// A menu section (som tam, grilled, drinks...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
    pub sort_order: i64,
    /// Cleared instead of deleting (soft delete).
    pub is_active: bool,
}

/// A dish or drink on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MenuItem {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown on the menu, kitchen ticket and receipt.
    pub name: String,

    pub description: Option<String>,

    /// Image path or URL.
    pub image: Option<String>,

    /// Price in the smallest currency unit.
    pub price_cents: i64,

    pub category_id: String,

    /// Sold out items stay on the menu but cannot be picked in the UI.
    pub is_available: bool,

    /// Shown first on the menu.
    pub is_popular: bool,

    /// Default spice level (0-5).
    pub spice_level: u8,

    /// Add-ons offered with this dish.
    pub addon_ids: Vec<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl MenuItem {
    /// Returns the price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Whether the add-on is offered with this dish.
    pub fn offers_addon(&self, addon_id: &str) -> bool {
        self.addon_ids.iter().any(|id| id == addon_id)
    }
}

/// An optional priced modifier (salted egg, extra crab...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Addon {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    pub is_active: bool,
}

impl Addon {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Kitchen-facing status of an order.
///
/// ```text
///   pending ──► preparing ──► ready ──► completed
///      │            │           │
///      └────────────┴───────────┴──────► cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Taken, kitchen has not started. Lines may still change.
    Pending,
    /// Kitchen is cooking.
    Preparing,
    /// Waiting for pickup / serving.
    Ready,
    /// Served. Terminal.
    Completed,
    /// Cancelled or refunded. Terminal.
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [
        OrderStatus::Pending,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// No transition leaves a terminal status (refund aside).
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Orders the kitchen still has to deal with.
    pub const fn is_active(&self) -> bool {
        matches!(
            self,
            OrderStatus::Pending | OrderStatus::Preparing | OrderStatus::Ready
        )
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OrderStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

// =============================================================================
// Payment Status
// =============================================================================

/// Money-facing status of an order, orthogonal to [`OrderStatus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
    /// Refunded orders are always cancelled.
    Refunded,
}

impl Default for PaymentStatus {
    fn default() -> Self {
        PaymentStatus::Unpaid
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Unpaid => "unpaid",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Refunded => "refunded",
        };
        f.write_str(s)
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash. The only method with change.
    Cash,
    /// Thai QR payment. Treated as immediately successful.
    Promptpay,
    /// Card on an external terminal. Treated as immediately successful.
    CreditCard,
}

impl PaymentMethod {
    pub const ALL: [PaymentMethod; 3] = [
        PaymentMethod::Cash,
        PaymentMethod::Promptpay,
        PaymentMethod::CreditCard,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Promptpay => "promptpay",
            PaymentMethod::CreditCard => "credit_card",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = crate::error::ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethod::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| crate::error::ValidationError::NotAllowed {
                field: "method".to_string(),
                allowed: PaymentMethod::ALL
                    .iter()
                    .map(|m| m.as_str().to_string())
                    .collect(),
            })
    }
}

/// Lifecycle of a payment record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
    Refunded,
}

// =============================================================================
// Order
// =============================================================================

/// An add-on as selected on an order line, with its price frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineAddon {
    pub addon_id: String,
    /// Add-on name at time of ordering (frozen).
    pub name: String,
    /// Add-on price at time of ordering (frozen).
    pub price_cents: i64,
}

/// One priced entry within an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    /// Menu item name at time of ordering (frozen).
    pub name_snapshot: String,
    pub quantity: i64,
    /// Menu item price at time of ordering (frozen).
    pub unit_price_cents: i64,
    pub addons: Vec<LineAddon>,
    /// `(unit price + Σ add-on prices) × quantity`.
    pub total_price_cents: i64,
    pub spice_level: u8,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// Sum of the frozen add-on prices for one unit.
    pub fn addons_price(&self) -> Money {
        self.addons
            .iter()
            .map(|a| Money::from_cents(a.price_cents))
            .sum()
    }
}

/// A customer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable number, `ORD-YYYYMMDD-NNNN`.
    pub order_number: String,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<PaymentMethod>,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    /// Set only on the transition to `completed`.
    #[ts(as = "Option<String>")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Total number of units across all lines.
    pub fn item_count(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub fn find_line(&self, line_id: &str) -> Option<&OrderLine> {
        self.lines.iter().find(|l| l.id == line_id)
    }
}

// =============================================================================
// Payment
// =============================================================================

/// A settlement recorded against an order.
///
/// One order has at most one payment that is not refunded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Order total at settlement time (frozen).
    pub amount_cents: i64,
    pub method: PaymentMethod,
    /// For cash: amount the customer handed over.
    pub received_cents: Option<i64>,
    /// For cash: change returned. Zero for other methods.
    pub change_cents: i64,
    /// External reference (QR slip, card auth code...).
    pub transaction_id: Option<String>,
    pub status: PaymentState,
    pub refund_reason: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn change(&self) -> Money {
        Money::from_cents(self.change_cents)
    }
}

// =============================================================================
// Daily Aggregate
// =============================================================================

/// Cached per-day rollup used by the dashboard.
///
/// Never authoritative: it can always be rebuilt from orders and payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DailyStat {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_orders: i64,
    pub total_revenue_cents: i64,
    pub total_items: i64,
}

impl DailyStat {
    pub fn empty(date: NaiveDate) -> Self {
        DailyStat {
            date,
            total_orders: 0,
            total_revenue_cents: 0,
            total_items: 0,
        }
    }

    pub fn revenue(&self) -> Money {
        Money::from_cents(self.total_revenue_cents)
    }

    /// Average order value, zero on a day without orders.
    pub fn avg_order_value(&self) -> Money {
        if self.total_orders <= 0 {
            return Money::zero();
        }
        Money::from_cents(self.total_revenue_cents / self.total_orders)
    }
}

/// Signed change applied to a [`DailyStat`] row in one atomic statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyStatDelta {
    pub orders: i64,
    pub revenue_cents: i64,
    pub items: i64,
}

impl DailyStatDelta {
    /// Delta recorded when a payment completes.
    pub fn payment(payment: &Payment, order: &Order) -> Self {
        DailyStatDelta {
            orders: 1,
            revenue_cents: payment.amount_cents,
            items: order.item_count(),
        }
    }

    /// Delta reversing [`DailyStatDelta::payment`].
    pub fn refund(payment: &Payment, order: &Order) -> Self {
        let d = Self::payment(payment, order);
        DailyStatDelta {
            orders: -d.orders,
            revenue_cents: -d.revenue_cents,
            items: -d.items,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

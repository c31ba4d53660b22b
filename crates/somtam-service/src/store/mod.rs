//! # Store Port
//!
//! Everything the services need from persistence, behind one object-safe
//! async trait.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  OrderService / CatalogService / ReportService / SettingsService       │
//! │       │                                                                 │
//! │       │  Arc<dyn Store>                                                 │
//! │       ▼                                                                 │
//! │  ┌───────────────────────┐         ┌───────────────────────┐           │
//! │  │  SqliteStore          │         │  MemoryStore          │           │
//! │  │  somtam-db repos,     │         │  maps behind one      │           │
//! │  │  SQL transactions     │         │  tokio Mutex          │           │
//! │  └───────────────────────┘         └───────────────────────┘           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Atomicity contract
//! - `insert_order` / `save_order`: header and line set land together
//! - `settle_payment` / `refund_payment`: payment row and order header
//!   land together; `settle_payment` returns `Conflict` when the order
//!   already has a completed payment
//! - `next_order_sequence`, `bump_daily_stat`, `apply_daily_stat`: one
//!   atomic step each, safe under concurrent callers

pub mod memory;
pub mod sqlite;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;

use somtam_core::{
    Addon, Catalog, Category, DailyStat, DailyStatDelta, MenuItem, Order, OrderFilter, Payment,
    PaymentFilter,
};

use crate::error::StoreResult;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Catalog
    // =========================================================================

    async fn list_categories(&self, include_inactive: bool) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: &str) -> StoreResult<Option<Category>>;
    async fn save_category(&self, category: &Category) -> StoreResult<()>;
    /// Soft delete. Returns whether the category existed.
    async fn deactivate_category(&self, id: &str) -> StoreResult<bool>;

    async fn list_menu_items(&self, category_id: Option<&str>) -> StoreResult<Vec<MenuItem>>;
    async fn get_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>>;
    /// Insert or replace, eligibility included. `Rejected` for an unknown
    /// category or add-on.
    async fn save_menu_item(&self, item: &MenuItem) -> StoreResult<()>;
    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool>;
    async fn set_menu_item_availability(
        &self,
        id: &str,
        available: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool>;

    async fn list_addons(&self, include_inactive: bool) -> StoreResult<Vec<Addon>>;
    async fn get_addon(&self, id: &str) -> StoreResult<Option<Addon>>;
    async fn save_addon(&self, addon: &Addon) -> StoreResult<()>;
    async fn deactivate_addon(&self, id: &str) -> StoreResult<bool>;

    /// Snapshot used for pricing and reports, inactive entries included.
    async fn load_catalog(&self) -> StoreResult<Catalog>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// 1, 2, 3... per calendar date, never handed out twice.
    async fn next_order_sequence(&self, date: NaiveDate) -> StoreResult<i64>;
    async fn insert_order(&self, order: &Order) -> StoreResult<()>;
    /// Header and full line set.
    async fn save_order(&self, order: &Order) -> StoreResult<()>;
    /// Header only; lines are left as stored.
    async fn save_order_header(&self, order: &Order) -> StoreResult<()>;
    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>>;
    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>>;

    // =========================================================================
    // Payments
    // =========================================================================

    async fn settle_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()>;
    /// `NotFound` unless the stored payment is still completed.
    async fn refund_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()>;
    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>>;
    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>>;

    // =========================================================================
    // Settings
    // =========================================================================

    async fn get_settings(&self) -> StoreResult<HashMap<String, String>>;
    async fn put_settings(&self, pairs: &[(String, String)], now: DateTime<Utc>) -> StoreResult<()>;
    async fn delete_setting(&self, key: &str) -> StoreResult<bool>;

    // =========================================================================
    // Daily aggregate
    // =========================================================================

    /// Adds `delta`, creating the day when missing.
    async fn bump_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<()>;
    /// Adds `delta` to an existing day only. Returns whether the day existed.
    async fn apply_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<bool>;
    async fn put_daily_stat(&self, stat: &DailyStat) -> StoreResult<()>;
    async fn get_daily_stat(&self, date: NaiveDate) -> StoreResult<Option<DailyStat>>;
    /// Recorded days in `[from, to]`, oldest first. Days with no row are absent.
    async fn list_daily_stats(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<DailyStat>>;
}

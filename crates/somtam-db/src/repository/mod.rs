//! # Repository Module
//!
//! Database repository implementations for Somtam POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SqliteStore (somtam-service)                                           │
//! │       │                                                                 │
//! │       │  db.orders().get_by_id(id)                                      │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── insert(&order)          one transaction: header + lines + add-ons  │
//! │  ├── save(&order)            one transaction: header + line set         │
//! │  ├── get_by_id / list(filter)                                          │
//! │  └── next_sequence(date)     atomic upsert ... RETURNING                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Queries are built at runtime (`sqlx::query` / `QueryBuilder`) and rows are
//! mapped through `FromRow` structs, so the crate builds without a live
//! database or offline query cache.
//!
//! ## Available Repositories
//!
//! - [`MenuRepository`](menu::MenuRepository) - Categories, menu items, add-ons
//! - [`OrderRepository`](order::OrderRepository) - Orders, lines, order numbers
//! - [`PaymentRepository`](payment::PaymentRepository) - Settlement and refund
//! - [`SettingRepository`](setting::SettingRepository) - Key-value shop settings
//! - [`DailyStatRepository`](daily_stat::DailyStatRepository) - Dashboard cache

pub mod daily_stat;
pub mod menu;
pub mod order;
pub mod payment;
pub mod setting;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::error::{DbError, DbResult};

/// Canonical text form of a timestamp.
///
/// Fixed precision and a `Z` suffix keep string order equal to time order,
/// which the range filters rely on.
pub(crate) fn ts(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn ts_opt(dt: &Option<DateTime<Utc>>) -> Option<String> {
    dt.as_ref().map(ts)
}

pub(crate) fn spice_level(raw: i64, table: &str) -> DbResult<u8> {
    u8::try_from(raw).map_err(|_| DbError::decode(table, format!("spice_level {raw} out of range")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_timestamp_text_sorts_chronologically() {
        let a = Utc.with_ymd_and_hms(2026, 10, 16, 9, 59, 59).unwrap();
        let b = a + chrono::Duration::microseconds(1);
        assert_eq!(ts(&a), "2026-10-16T09:59:59.000000Z");
        assert!(ts(&a) < ts(&b));
    }
}

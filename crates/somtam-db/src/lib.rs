//! # somtam-db: Database Layer for Somtam POS
//!
//! This crate provides database access for the Somtam POS system.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Somtam POS Data Flow                              │
//! │                                                                         │
//! │  OrderService::process_payment (somtam-service)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    somtam-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ MenuRepo      │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │ 001_initial  │  │   │
//! │  │   │ Connection    │    │ PaymentRepo   │    │ ...          │  │   │
//! │  │   │ Management    │    │ SettingRepo   │    │              │  │   │
//! │  │   │               │    │ DailyStatRepo │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/somtam-pos/somtam.db                           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (menu, order, payment...)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use somtam_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("somtam.db")).await?;
//!
//! let catalog = db.menu().load_catalog().await?;
//! let seq = db.orders().next_sequence(today).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::daily_stat::DailyStatRepository;
pub use repository::menu::MenuRepository;
pub use repository::order::OrderRepository;
pub use repository::payment::PaymentRepository;
pub use repository::setting::SettingRepository;

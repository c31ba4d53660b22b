//! # somtam-service: Operations for Somtam POS
//!
//! The layer a transport calls. Each operation loads what it needs through
//! the [`Store`] port, applies a `somtam-core` rule and persists the result.
//!
//! ## Wiring
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ServiceConfig::load()  (SOMTAM_* env vars)                             │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  PosServices::open(&config)                                             │
//! │        │                                                                │
//! │        ├── orders:   OrderService    (lifecycle, payment, refund)       │
//! │        ├── catalog:  CatalogService  (menu, categories, add-ons)        │
//! │        ├── reports:  ReportService   (dashboard folds)                  │
//! │        └── settings: SettingsService (shop key-values)                  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │        ServiceContext { Arc<dyn Store>, Arc<dyn Clock>, UTC offset }    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//! ```rust,no_run
//! use somtam_service::{PosServices, ServiceConfig};
//! use somtam_core::{CreateOrderRequest, LineRequest, PaymentRequest};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let pos = PosServices::open(&ServiceConfig::load()?).await?;
//!
//! let order = pos
//!     .orders
//!     .create_order(CreateOrderRequest {
//!         lines: vec![LineRequest::new("som-tam-id", 1)],
//!         ..Default::default()
//!     })
//!     .await?;
//! let (payment, _) = pos
//!     .orders
//!     .process_payment(&order.id, PaymentRequest::cash(10000))
//!     .await?;
//! println!("change: {}", payment.change());
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod locks;
pub mod services;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorBody, ErrorCode, ServiceError, ServiceResult, StoreError, StoreResult};
pub use locks::OrderLocks;
pub use services::{
    AddonDraft, CatalogService, CategoryDraft, MenuItemDraft, OrderService, PosServices,
    ReportService, ServiceContext, SettingsService,
};
pub use store::{MemoryStore, SqliteStore, Store};

//! Service implementations.
//!
//! Each service is a cheap handle over a shared [`ServiceContext`]; clone
//! freely into request handlers.

pub mod catalog;
pub mod order;
pub mod report;
pub mod settings;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use std::sync::Arc;

use somtam_core::{Catalog, ReportClock, ShopSettings};

use crate::clock::{Clock, SystemClock};
use crate::config::ServiceConfig;
use crate::error::ServiceResult;
use crate::store::{SqliteStore, Store};

pub use catalog::{AddonDraft, CatalogService, CategoryDraft, MenuItemDraft};
pub use order::OrderService;
pub use report::ReportService;
pub use settings::SettingsService;

/// What every service needs: the store, the clock and the shop's UTC offset.
#[derive(Clone)]
pub struct ServiceContext {
    store: Arc<dyn Store>,
    clock: Arc<dyn Clock>,
    offset: FixedOffset,
}

impl ServiceContext {
    pub fn new(store: Arc<dyn Store>, clock: Arc<dyn Clock>, offset: FixedOffset) -> Self {
        ServiceContext {
            store,
            clock,
            offset,
        }
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Report clock anchored at the current shop-local day.
    pub fn report_clock(&self) -> ReportClock {
        ReportClock::new(self.now(), self.offset)
    }

    /// Shop-local calendar date of an instant.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Typed settings, read fresh for every operation.
    pub async fn shop_settings(&self) -> ServiceResult<ShopSettings> {
        let pairs = self.store.get_settings().await?;
        Ok(ShopSettings::from_pairs(&pairs)?)
    }

    pub async fn catalog(&self) -> ServiceResult<Catalog> {
        Ok(self.store.load_catalog().await?)
    }
}

/// All four services over one context.
#[derive(Clone)]
pub struct PosServices {
    pub orders: OrderService,
    pub catalog: CatalogService,
    pub reports: ReportService,
    pub settings: SettingsService,
}

impl PosServices {
    pub fn new(ctx: ServiceContext) -> Self {
        PosServices {
            orders: OrderService::new(ctx.clone()),
            catalog: CatalogService::new(ctx.clone()),
            reports: ReportService::new(ctx.clone()),
            settings: SettingsService::new(ctx),
        }
    }

    /// Production wiring: SQLite at the configured path, system clock.
    pub async fn open(config: &ServiceConfig) -> ServiceResult<Self> {
        let store = SqliteStore::open(config).await?;
        Ok(Self::new(ServiceContext::new(
            Arc::new(store),
            Arc::new(SystemClock),
            config.utc_offset(),
        )))
    }
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    //! A seeded context over each store adapter, pinned to a manual clock.

    use chrono::{FixedOffset, TimeZone};

    use super::*;
    use crate::clock::ManualClock;
    use crate::store::MemoryStore;
    use somtam_core::{Addon, Category, MenuItem};

    pub const SOM_TAM: &str = "11111111-1111-4111-8111-111111111111";
    pub const LARB: &str = "22222222-2222-4222-8222-222222222222";
    pub const STICKY_RICE: &str = "33333333-3333-4333-8333-333333333333";
    pub const SALTED_EGG: &str = "aaaaaaaa-aaaa-4aaa-8aaa-aaaaaaaaaaaa";
    pub const DRIED_SHRIMP: &str = "bbbbbbbb-bbbb-4bbb-8bbb-bbbbbbbbbbbb";
    pub const CAT_SALAD: &str = "c1";
    pub const CAT_RICE: &str = "c2";

    /// 12:00 in Bangkok on 2026-10-16.
    pub fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 5, 0, 0).unwrap()
    }

    pub fn bangkok() -> FixedOffset {
        FixedOffset::east_opt(7 * 3600).unwrap()
    }

    fn category(id: &str, name: &str, sort_order: i64) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: None,
            sort_order,
            is_active: true,
        }
    }

    fn item(id: &str, name: &str, price_cents: i64, category_id: &str, addons: &[&str]) -> MenuItem {
        MenuItem {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            image: None,
            price_cents,
            category_id: category_id.to_string(),
            is_available: true,
            is_popular: false,
            spice_level: 2,
            addon_ids: addons.iter().map(|a| a.to_string()).collect(),
            created_at: noon(),
            updated_at: noon(),
        }
    }

    fn addon(id: &str, name: &str, price_cents: i64) -> Addon {
        Addon {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            is_active: true,
        }
    }

    /// Som tam 45.00, larb 80.00, sticky rice 10.00; salted egg 10.00,
    /// dried shrimp 15.00.
    pub async fn seed(store: &dyn Store) {
        store.save_category(&category(CAT_SALAD, "Som Tam", 1)).await.unwrap();
        store.save_category(&category(CAT_RICE, "Rice", 2)).await.unwrap();
        store.save_addon(&addon(SALTED_EGG, "Salted egg", 1000)).await.unwrap();
        store.save_addon(&addon(DRIED_SHRIMP, "Dried shrimp", 1500)).await.unwrap();
        store
            .save_menu_item(&item(SOM_TAM, "Som Tam Thai", 4500, CAT_SALAD, &[SALTED_EGG, DRIED_SHRIMP]))
            .await
            .unwrap();
        store
            .save_menu_item(&item(LARB, "Larb Moo", 8000, CAT_SALAD, &[]))
            .await
            .unwrap();
        store
            .save_menu_item(&item(STICKY_RICE, "Sticky Rice", 1000, CAT_RICE, &[]))
            .await
            .unwrap();
    }

    async fn context(store: Arc<dyn Store>) -> (ServiceContext, ManualClock) {
        seed(store.as_ref()).await;
        let clock = ManualClock::new(noon());
        let ctx = ServiceContext::new(store, Arc::new(clock.clone()), bangkok());
        (ctx, clock)
    }

    pub async fn memory() -> (ServiceContext, ManualClock) {
        context(Arc::new(MemoryStore::new())).await
    }

    pub async fn sqlite() -> (ServiceContext, ManualClock) {
        context(Arc::new(SqliteStore::in_memory().await.unwrap())).await
    }

    /// One seeded context per adapter, labelled for assertion messages.
    pub async fn contexts() -> Vec<(&'static str, ServiceContext, ManualClock)> {
        let (mem, mem_clock) = memory().await;
        let (sql, sql_clock) = sqlite().await;
        vec![("memory", mem, mem_clock), ("sqlite", sql, sql_clock)]
    }
}

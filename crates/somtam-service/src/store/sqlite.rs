//! [`Store`] over the SQLite repositories.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tracing::info;

use somtam_core::{
    Addon, Catalog, Category, DailyStat, DailyStatDelta, MenuItem, Order, OrderFilter, Payment,
    PaymentFilter,
};
use somtam_db::{Database, DbConfig};

use super::Store;
use crate::config::ServiceConfig;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    pub fn new(db: Database) -> Self {
        SqliteStore { db }
    }

    /// Opens (creating if needed) the database the configuration points at.
    pub async fn open(config: &ServiceConfig) -> StoreResult<Self> {
        if let Some(dir) = config.database_path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| StoreError::Backend(e.to_string()))?;
        }
        let db = Database::new(config.db_config()).await?;
        info!(path = %config.database_path.display(), "SQLite store ready");
        Ok(SqliteStore { db })
    }

    /// A fresh, migrated in-memory database.
    pub async fn in_memory() -> StoreResult<Self> {
        Ok(SqliteStore {
            db: Database::new(DbConfig::in_memory()).await?,
        })
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_categories(&self, include_inactive: bool) -> StoreResult<Vec<Category>> {
        Ok(self.db.menu().list_categories(include_inactive).await?)
    }

    async fn get_category(&self, id: &str) -> StoreResult<Option<Category>> {
        Ok(self.db.menu().get_category(id).await?)
    }

    async fn save_category(&self, category: &Category) -> StoreResult<()> {
        Ok(self.db.menu().save_category(category).await?)
    }

    async fn deactivate_category(&self, id: &str) -> StoreResult<bool> {
        Ok(self.db.menu().deactivate_category(id).await?)
    }

    async fn list_menu_items(&self, category_id: Option<&str>) -> StoreResult<Vec<MenuItem>> {
        Ok(self.db.menu().list_items(category_id).await?)
    }

    async fn get_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        Ok(self.db.menu().get_item(id).await?)
    }

    async fn save_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        Ok(self.db.menu().save_item(item).await?)
    }

    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool> {
        Ok(self.db.menu().delete_item(id).await?)
    }

    async fn set_menu_item_availability(
        &self,
        id: &str,
        available: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        Ok(self.db.menu().set_item_availability(id, available, now).await?)
    }

    async fn list_addons(&self, include_inactive: bool) -> StoreResult<Vec<Addon>> {
        Ok(self.db.menu().list_addons(include_inactive).await?)
    }

    async fn get_addon(&self, id: &str) -> StoreResult<Option<Addon>> {
        Ok(self.db.menu().get_addon(id).await?)
    }

    async fn save_addon(&self, addon: &Addon) -> StoreResult<()> {
        Ok(self.db.menu().save_addon(addon).await?)
    }

    async fn deactivate_addon(&self, id: &str) -> StoreResult<bool> {
        Ok(self.db.menu().deactivate_addon(id).await?)
    }

    async fn load_catalog(&self) -> StoreResult<Catalog> {
        Ok(self.db.menu().load_catalog().await?)
    }

    async fn next_order_sequence(&self, date: NaiveDate) -> StoreResult<i64> {
        Ok(self.db.orders().next_sequence(date).await?)
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        Ok(self.db.orders().insert(order).await?)
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        Ok(self.db.orders().save(order).await?)
    }

    async fn save_order_header(&self, order: &Order) -> StoreResult<()> {
        Ok(self.db.orders().update_header(order).await?)
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.db.orders().get_by_id(id).await?)
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        Ok(self.db.orders().list(filter).await?)
    }

    async fn settle_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()> {
        Ok(self.db.payments().settle(payment, order).await?)
    }

    async fn refund_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()> {
        Ok(self.db.payments().refund(payment, order).await?)
    }

    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        Ok(self.db.payments().get_by_id(id).await?)
    }

    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        Ok(self.db.payments().list(filter).await?)
    }

    async fn get_settings(&self) -> StoreResult<HashMap<String, String>> {
        Ok(self.db.settings().get_all().await?)
    }

    async fn put_settings(&self, pairs: &[(String, String)], now: DateTime<Utc>) -> StoreResult<()> {
        Ok(self.db.settings().upsert_many(pairs, now).await?)
    }

    async fn delete_setting(&self, key: &str) -> StoreResult<bool> {
        Ok(self.db.settings().delete(key).await?)
    }

    async fn bump_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<()> {
        Ok(self.db.daily_stats().bump(date, delta).await?)
    }

    async fn apply_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<bool> {
        Ok(self.db.daily_stats().apply(date, delta).await?)
    }

    async fn put_daily_stat(&self, stat: &DailyStat) -> StoreResult<()> {
        Ok(self.db.daily_stats().put(stat).await?)
    }

    async fn get_daily_stat(&self, date: NaiveDate) -> StoreResult<Option<DailyStat>> {
        Ok(self.db.daily_stats().get(date).await?)
    }

    async fn list_daily_stats(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<DailyStat>> {
        Ok(self.db.daily_stats().list(from, to).await?)
    }
}

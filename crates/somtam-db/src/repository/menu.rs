//! # Menu Repository
//!
//! Categories, menu items, add-ons and the item ↔ add-on eligibility table.
//!
//! Categories and add-ons are soft deleted (`is_active = 0`) because old
//! order lines still name them. Menu items are hard deleted: lines keep a
//! snapshot of everything they need.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;

use somtam_core::{Addon, Catalog, Category, MenuItem};

use super::{spice_level, ts};
use crate::error::DbResult;

#[derive(Debug, FromRow)]
struct MenuItemRow {
    id: String,
    name: String,
    description: Option<String>,
    image: Option<String>,
    price_cents: i64,
    category_id: String,
    is_available: bool,
    is_popular: bool,
    spice_level: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MenuItemRow {
    fn into_menu_item(self, addon_ids: Vec<String>) -> DbResult<MenuItem> {
        Ok(MenuItem {
            spice_level: spice_level(self.spice_level, "menu_items")?,
            id: self.id,
            name: self.name,
            description: self.description,
            image: self.image,
            price_cents: self.price_cents,
            category_id: self.category_id,
            is_available: self.is_available,
            is_popular: self.is_popular,
            addon_ids,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const MENU_ITEM_COLUMNS: &str = "id, name, description, image, price_cents, category_id, \
     is_available, is_popular, spice_level, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct MenuRepository {
    pool: SqlitePool,
}

impl MenuRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MenuRepository { pool }
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self, include_inactive: bool) -> DbResult<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT id, name, icon, sort_order, is_active
            FROM categories
            WHERE is_active = 1 OR ?1
            ORDER BY sort_order, name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    pub async fn get_category(&self, id: &str) -> DbResult<Option<Category>> {
        let category = sqlx::query_as::<_, Category>(
            "SELECT id, name, icon, sort_order, is_active FROM categories WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(category)
    }

    /// Inserts or replaces a category by id.
    pub async fn save_category(&self, category: &Category) -> DbResult<()> {
        debug!(id = %category.id, name = %category.name, "Saving category");

        sqlx::query(
            r#"
            INSERT INTO categories (id, name, icon, sort_order, is_active)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                icon = excluded.icon,
                sort_order = excluded.sort_order,
                is_active = excluded.is_active
            "#,
        )
        .bind(&category.id)
        .bind(&category.name)
        .bind(&category.icon)
        .bind(category.sort_order)
        .bind(category.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft delete. Returns whether a row was touched.
    pub async fn deactivate_category(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE categories SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Menu Items
    // =========================================================================

    /// Lists menu items, optionally within one category. Popular first.
    pub async fn list_items(&self, category_id: Option<&str>) -> DbResult<Vec<MenuItem>> {
        let sql = format!(
            "SELECT {MENU_ITEM_COLUMNS} FROM menu_items \
             WHERE (?1 IS NULL OR category_id = ?1) \
             ORDER BY is_popular DESC, name"
        );
        let rows = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(category_id)
            .fetch_all(&self.pool)
            .await?;

        let mut eligibility = self.eligibility().await?;
        rows.into_iter()
            .map(|row| {
                let addon_ids = eligibility.remove(&row.id).unwrap_or_default();
                row.into_menu_item(addon_ids)
            })
            .collect()
    }

    pub async fn get_item(&self, id: &str) -> DbResult<Option<MenuItem>> {
        let sql = format!("SELECT {MENU_ITEM_COLUMNS} FROM menu_items WHERE id = ?1");
        let Some(row) = sqlx::query_as::<_, MenuItemRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let addon_ids: Vec<String> = sqlx::query_scalar(
            "SELECT addon_id FROM menu_item_addons WHERE menu_item_id = ?1 ORDER BY addon_id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        row.into_menu_item(addon_ids).map(Some)
    }

    /// Inserts or replaces a menu item and its eligible add-ons in one
    /// transaction.
    pub async fn save_item(&self, item: &MenuItem) -> DbResult<()> {
        debug!(id = %item.id, name = %item.name, "Saving menu item");

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO menu_items (
                id, name, description, image, price_cents, category_id,
                is_available, is_popular, spice_level, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                description = excluded.description,
                image = excluded.image,
                price_cents = excluded.price_cents,
                category_id = excluded.category_id,
                is_available = excluded.is_available,
                is_popular = excluded.is_popular,
                spice_level = excluded.spice_level,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(&item.description)
        .bind(&item.image)
        .bind(item.price_cents)
        .bind(&item.category_id)
        .bind(item.is_available)
        .bind(item.is_popular)
        .bind(i64::from(item.spice_level))
        .bind(ts(&item.created_at))
        .bind(ts(&item.updated_at))
        .execute(&mut *tx)
        .await?;

        replace_eligibility(&mut tx, &item.id, &item.addon_ids).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Hard delete. Eligibility rows cascade.
    pub async fn delete_item(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM menu_items WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Marks an item sold out (or back on).
    pub async fn set_item_availability(
        &self,
        id: &str,
        available: bool,
        now: DateTime<Utc>,
    ) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE menu_items SET is_available = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(available)
        .bind(ts(&now))
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn eligibility(&self) -> DbResult<HashMap<String, Vec<String>>> {
        let pairs: Vec<(String, String)> = sqlx::query_as(
            "SELECT menu_item_id, addon_id FROM menu_item_addons ORDER BY menu_item_id, addon_id",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut map: HashMap<String, Vec<String>> = HashMap::new();
        for (item_id, addon_id) in pairs {
            map.entry(item_id).or_default().push(addon_id);
        }
        Ok(map)
    }

    // =========================================================================
    // Add-ons
    // =========================================================================

    pub async fn list_addons(&self, include_inactive: bool) -> DbResult<Vec<Addon>> {
        let addons = sqlx::query_as::<_, Addon>(
            r#"
            SELECT id, name, price_cents, is_active
            FROM addons
            WHERE is_active = 1 OR ?1
            ORDER BY name
            "#,
        )
        .bind(include_inactive)
        .fetch_all(&self.pool)
        .await?;

        Ok(addons)
    }

    pub async fn get_addon(&self, id: &str) -> DbResult<Option<Addon>> {
        let addon = sqlx::query_as::<_, Addon>(
            "SELECT id, name, price_cents, is_active FROM addons WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(addon)
    }

    pub async fn save_addon(&self, addon: &Addon) -> DbResult<()> {
        debug!(id = %addon.id, name = %addon.name, "Saving add-on");

        sqlx::query(
            r#"
            INSERT INTO addons (id, name, price_cents, is_active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                price_cents = excluded.price_cents,
                is_active = excluded.is_active
            "#,
        )
        .bind(&addon.id)
        .bind(&addon.name)
        .bind(addon.price_cents)
        .bind(addon.is_active)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Soft delete. Existing eligibility is kept so old carts still price.
    pub async fn deactivate_addon(&self, id: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE addons SET is_active = 0 WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    // Catalog snapshot
    // =========================================================================

    /// Everything the pricing engine and report folds need, inactive
    /// entries included.
    pub async fn load_catalog(&self) -> DbResult<Catalog> {
        let items = self.list_items(None).await?;
        let addons = self.list_addons(true).await?;
        let categories = self.list_categories(true).await?;

        debug!(
            items = items.len(),
            addons = addons.len(),
            categories = categories.len(),
            "Catalog loaded"
        );
        Ok(Catalog::new(items, addons, categories))
    }
}

async fn replace_eligibility(
    tx: &mut Transaction<'_, Sqlite>,
    menu_item_id: &str,
    addon_ids: &[String],
) -> DbResult<()> {
    sqlx::query("DELETE FROM menu_item_addons WHERE menu_item_id = ?1")
        .bind(menu_item_id)
        .execute(&mut **tx)
        .await?;

    for addon_id in addon_ids {
        sqlx::query(
            "INSERT OR IGNORE INTO menu_item_addons (menu_item_id, addon_id) VALUES (?1, ?2)",
        )
        .bind(menu_item_id)
        .bind(addon_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{Database, DbConfig};

    pub(crate) fn category(id: &str, name: &str) -> Category {
        Category {
            id: id.to_string(),
            name: name.to_string(),
            icon: None,
            sort_order: 0,
            is_active: true,
        }
    }

    pub(crate) fn addon(id: &str, name: &str, price_cents: i64) -> Addon {
        Addon {
            id: id.to_string(),
            name: name.to_string(),
            price_cents,
            is_active: true,
        }
    }

    pub(crate) fn item(id: &str, name: &str, price_cents: i64, category_id: &str, addons: &[&str]) -> MenuItem {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
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
            created_at: now,
            updated_at: now,
        }
    }

    /// Isan menu: som tam (45) and larb (60) with salted egg (10).
    pub(crate) async fn seeded() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let menu = db.menu();
        menu.save_category(&category("cat-salad", "Som Tam")).await.unwrap();
        menu.save_addon(&addon("egg", "Salted Egg", 1000)).await.unwrap();
        menu.save_item(&item("somtam", "Som Tam Thai", 4500, "cat-salad", &["egg"]))
            .await
            .unwrap();
        menu.save_item(&item("larb", "Larb Moo", 6000, "cat-salad", &[]))
            .await
            .unwrap();
        db
    }

    #[tokio::test]
    async fn test_item_round_trip_with_eligibility() {
        let db = seeded().await;

        let somtam = db.menu().get_item("somtam").await.unwrap().unwrap();
        assert_eq!(somtam.price_cents, 4500);
        assert_eq!(somtam.addon_ids, vec!["egg".to_string()]);
        assert_eq!(somtam.spice_level, 2);

        let mut updated = somtam.clone();
        updated.addon_ids.clear();
        updated.price_cents = 5000;
        db.menu().save_item(&updated).await.unwrap();

        let reloaded = db.menu().get_item("somtam").await.unwrap().unwrap();
        assert_eq!(reloaded.price_cents, 5000);
        assert!(reloaded.addon_ids.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_category_is_rejected() {
        let db = seeded().await;
        let err = db
            .menu()
            .save_item(&item("x", "Ghost", 100, "no-such-category", &[]))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_soft_deleted_addon_stays_in_catalog() {
        let db = seeded().await;
        assert!(db.menu().deactivate_addon("egg").await.unwrap());

        assert!(db.menu().list_addons(false).await.unwrap().is_empty());
        let catalog = db.menu().load_catalog().await.unwrap();
        assert!(catalog.addon("egg").is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn test_availability_and_delete() {
        let db = seeded().await;
        let now = Utc::now();

        assert!(db.menu().set_item_availability("larb", false, now).await.unwrap());
        assert!(!db.menu().get_item("larb").await.unwrap().unwrap().is_available);

        assert!(db.menu().delete_item("larb").await.unwrap());
        assert!(!db.menu().delete_item("larb").await.unwrap());
        assert_eq!(db.menu().list_items(Some("cat-salad")).await.unwrap().len(), 1);
    }
}

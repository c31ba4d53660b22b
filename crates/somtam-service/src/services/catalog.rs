//! # Catalog Service
//!
//! Menu management: categories, menu items and add-ons.
//!
//! Categories and add-ons are soft deleted so old orders and reports keep
//! resolving their names. Menu items are hard deleted; order lines carry a
//! name snapshot.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use somtam_core::validation::{
    validate_name, validate_optional_text, validate_price_cents, validate_spice_level,
    MAX_NOTES_LEN,
};
use somtam_core::{Addon, Catalog, Category, CoreError, MenuItem};

use super::ServiceContext;
use crate::error::ServiceResult;

/// Longest icon or image reference accepted.
const MAX_ASSET_LEN: usize = 500;

// =============================================================================
// Drafts
// =============================================================================

/// Editable fields of a menu item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub price_cents: i64,
    pub category_id: String,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub is_popular: bool,
    #[serde(default)]
    pub spice_level: u8,
    #[serde(default)]
    pub addon_ids: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryDraft {
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddonDraft {
    pub name: String,
    pub price_cents: i64,
}

fn default_true() -> bool {
    true
}

// =============================================================================
// Service
// =============================================================================

#[derive(Clone)]
pub struct CatalogService {
    ctx: ServiceContext,
}

impl CatalogService {
    pub fn new(ctx: ServiceContext) -> Self {
        CatalogService { ctx }
    }

    /// Full snapshot, inactive entries included.
    pub async fn catalog(&self) -> ServiceResult<Catalog> {
        self.ctx.catalog().await
    }

    // =========================================================================
    // Categories
    // =========================================================================

    pub async fn list_categories(&self, include_inactive: bool) -> ServiceResult<Vec<Category>> {
        Ok(self.ctx.store().list_categories(include_inactive).await?)
    }

    pub async fn create_category(&self, draft: CategoryDraft) -> ServiceResult<Category> {
        validate_category(&draft)?;
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            icon: draft.icon,
            sort_order: draft.sort_order,
            is_active: true,
        };
        self.ctx.store().save_category(&category).await?;

        info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    pub async fn update_category(&self, id: &str, draft: CategoryDraft) -> ServiceResult<Category> {
        validate_category(&draft)?;
        let mut category = self
            .ctx
            .store()
            .get_category(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Category", id))?;

        category.name = draft.name.trim().to_string();
        category.icon = draft.icon;
        category.sort_order = draft.sort_order;
        self.ctx.store().save_category(&category).await?;

        info!(category_id = %category.id, "Category updated");
        Ok(category)
    }

    pub async fn deactivate_category(&self, id: &str) -> ServiceResult<()> {
        if !self.ctx.store().deactivate_category(id).await? {
            return Err(CoreError::not_found("Category", id).into());
        }
        info!(category_id = %id, "Category deactivated");
        Ok(())
    }

    // =========================================================================
    // Menu Items
    // =========================================================================

    pub async fn list_menu_items(&self, category_id: Option<&str>) -> ServiceResult<Vec<MenuItem>> {
        Ok(self.ctx.store().list_menu_items(category_id).await?)
    }

    pub async fn get_menu_item(&self, id: &str) -> ServiceResult<MenuItem> {
        self.ctx
            .store()
            .get_menu_item(id)
            .await?
            .ok_or_else(|| CoreError::not_found("MenuItem", id).into())
    }

    pub async fn create_menu_item(&self, draft: MenuItemDraft) -> ServiceResult<MenuItem> {
        let draft = self.check_item(draft).await?;
        let now = self.ctx.now();
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            description: draft.description,
            image: draft.image,
            price_cents: draft.price_cents,
            category_id: draft.category_id,
            is_available: draft.is_available,
            is_popular: draft.is_popular,
            spice_level: draft.spice_level,
            addon_ids: draft.addon_ids,
            created_at: now,
            updated_at: now,
        };
        self.ctx.store().save_menu_item(&item).await?;

        info!(menu_item_id = %item.id, name = %item.name, price = %item.price(), "Menu item created");
        Ok(item)
    }

    pub async fn update_menu_item(&self, id: &str, draft: MenuItemDraft) -> ServiceResult<MenuItem> {
        let existing = self.get_menu_item(id).await?;
        let draft = self.check_item(draft).await?;

        let item = MenuItem {
            id: existing.id,
            name: draft.name.trim().to_string(),
            description: draft.description,
            image: draft.image,
            price_cents: draft.price_cents,
            category_id: draft.category_id,
            is_available: draft.is_available,
            is_popular: draft.is_popular,
            spice_level: draft.spice_level,
            addon_ids: draft.addon_ids,
            created_at: existing.created_at,
            updated_at: self.ctx.now(),
        };
        self.ctx.store().save_menu_item(&item).await?;

        info!(menu_item_id = %item.id, price = %item.price(), "Menu item updated");
        Ok(item)
    }

    /// Marks an item sold out (or back in stock).
    pub async fn set_availability(&self, id: &str, available: bool) -> ServiceResult<()> {
        let found = self
            .ctx
            .store()
            .set_menu_item_availability(id, available, self.ctx.now())
            .await?;
        if !found {
            return Err(CoreError::not_found("MenuItem", id).into());
        }
        info!(menu_item_id = %id, available, "Menu item availability changed");
        Ok(())
    }

    pub async fn delete_menu_item(&self, id: &str) -> ServiceResult<()> {
        if !self.ctx.store().delete_menu_item(id).await? {
            return Err(CoreError::not_found("MenuItem", id).into());
        }
        info!(menu_item_id = %id, "Menu item deleted");
        Ok(())
    }

    /// Shape checks plus references: the category must exist and every
    /// add-on must be known. Add-on ids come back deduplicated.
    async fn check_item(&self, mut draft: MenuItemDraft) -> ServiceResult<MenuItemDraft> {
        validate_name("name", &draft.name)?;
        validate_price_cents(draft.price_cents)?;
        validate_spice_level(draft.spice_level)?;
        validate_optional_text("description", draft.description.as_deref(), MAX_NOTES_LEN)?;
        validate_optional_text("image", draft.image.as_deref(), MAX_ASSET_LEN)?;

        if self.ctx.store().get_category(&draft.category_id).await?.is_none() {
            return Err(CoreError::not_found("Category", draft.category_id.as_str()).into());
        }

        draft.addon_ids.sort();
        draft.addon_ids.dedup();
        for addon_id in &draft.addon_ids {
            if self.ctx.store().get_addon(addon_id).await?.is_none() {
                return Err(CoreError::UnknownAddon(addon_id.clone()).into());
            }
        }
        Ok(draft)
    }

    // =========================================================================
    // Add-ons
    // =========================================================================

    pub async fn list_addons(&self, include_inactive: bool) -> ServiceResult<Vec<Addon>> {
        Ok(self.ctx.store().list_addons(include_inactive).await?)
    }

    pub async fn create_addon(&self, draft: AddonDraft) -> ServiceResult<Addon> {
        validate_addon(&draft)?;
        let addon = Addon {
            id: Uuid::new_v4().to_string(),
            name: draft.name.trim().to_string(),
            price_cents: draft.price_cents,
            is_active: true,
        };
        self.ctx.store().save_addon(&addon).await?;

        info!(addon_id = %addon.id, name = %addon.name, "Add-on created");
        Ok(addon)
    }

    pub async fn update_addon(&self, id: &str, draft: AddonDraft) -> ServiceResult<Addon> {
        validate_addon(&draft)?;
        let mut addon = self
            .ctx
            .store()
            .get_addon(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Addon", id))?;

        addon.name = draft.name.trim().to_string();
        addon.price_cents = draft.price_cents;
        self.ctx.store().save_addon(&addon).await?;

        info!(addon_id = %addon.id, price = %addon.price(), "Add-on updated");
        Ok(addon)
    }

    pub async fn deactivate_addon(&self, id: &str) -> ServiceResult<()> {
        if !self.ctx.store().deactivate_addon(id).await? {
            return Err(CoreError::not_found("Addon", id).into());
        }
        info!(addon_id = %id, "Add-on deactivated");
        Ok(())
    }
}

fn validate_category(draft: &CategoryDraft) -> ServiceResult<()> {
    validate_name("name", &draft.name)?;
    validate_optional_text("icon", draft.icon.as_deref(), MAX_ASSET_LEN)?;
    Ok(())
}

fn validate_addon(draft: &AddonDraft) -> ServiceResult<()> {
    validate_name("name", &draft.name)?;
    validate_price_cents(draft.price_cents)?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Catalog
//!
//! Read-only, id-indexed view over menu items, add-ons and categories.
//!
//! The pricing engine resolves every line against a `Catalog` snapshot, and
//! the report folds use it to map order lines back to categories. Callers
//! build one per operation from whatever store they use.

use std::collections::HashMap;

use crate::types::{Addon, Category, MenuItem};

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    menu_items: HashMap<String, MenuItem>,
    addons: HashMap<String, Addon>,
    categories: HashMap<String, Category>,
}

impl Catalog {
    pub fn new(
        menu_items: impl IntoIterator<Item = MenuItem>,
        addons: impl IntoIterator<Item = Addon>,
        categories: impl IntoIterator<Item = Category>,
    ) -> Self {
        Catalog {
            menu_items: menu_items
                .into_iter()
                .map(|m| (m.id.clone(), m))
                .collect(),
            addons: addons.into_iter().map(|a| (a.id.clone(), a)).collect(),
            categories: categories
                .into_iter()
                .map(|c| (c.id.clone(), c))
                .collect(),
        }
    }

    pub fn menu_item(&self, id: &str) -> Option<&MenuItem> {
        self.menu_items.get(id)
    }

    /// Looks up an add-on. Soft-deleted add-ons are still priced so that
    /// a stale terminal does not silently drop a paid-for extra.
    pub fn addon(&self, id: &str) -> Option<&Addon> {
        self.addons.get(id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.get(id)
    }

    /// Category of a menu item, if both still exist.
    pub fn category_of(&self, menu_item_id: &str) -> Option<&Category> {
        self.menu_item(menu_item_id)
            .and_then(|item| self.category(&item.category_id))
    }

    pub fn menu_items(&self) -> impl Iterator<Item = &MenuItem> {
        self.menu_items.values()
    }

    pub fn len(&self) -> usize {
        self.menu_items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.menu_items.is_empty()
    }
}

//! # Cart
//!
//! The terminal-side cart a cashier builds before placing an order.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Frontend Action          Cart Method               State Change        │
//! │  ───────────────          ───────────               ────────────        │
//! │                                                                         │
//! │  Tap dish ──────────────► add_item() ─────────────► merge or push       │
//! │  +/- buttons ───────────► update_quantity() ──────► qty = n (≤0 drops)  │
//! │  Spice slider ──────────► update_spice_level()                          │
//! │  Add-on chips ──────────► update_addons()                               │
//! │  Clear ─────────────────► clear()                                       │
//! │  Totals panel ──────────► preview() ──────────────► pricing engine      │
//! │  Checkout ──────────────► to_create_request() ────► CreateOrderRequest  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Entries are unique by (menu item, spice level, notes, add-on set);
//!   adding an identical selection increases the quantity
//! - At most [`MAX_ORDER_LINES`] entries, at most [`MAX_ITEM_QUANTITY`] each
//! - The cart never stores prices; [`Cart::preview`] asks the catalog

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::TaxRate;
use crate::order::{CreateOrderRequest, MAX_LABEL_LEN};
use crate::pricing::{price_order, AddonPolicy, LineRequest, PricedOrder};
use crate::validation::{
    validate_optional_text, validate_quantity, validate_spice_level, MAX_NOTES_LEN,
};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// One selection in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartEntry {
    /// Local id, used by the UI to address the entry.
    pub id: String,
    pub menu_item_id: String,
    pub quantity: i64,
    pub spice_level: u8,
    pub notes: Option<String>,
    /// Kept sorted so equal sets compare equal.
    pub addon_ids: Vec<String>,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartEntry {
    fn same_selection(&self, other: &LineRequest, addon_ids: &[String]) -> bool {
        self.menu_item_id == other.menu_item_id
            && self.spice_level == other.spice_level.unwrap_or(0)
            && self.notes == other.notes
            && self.addon_ids == addon_ids
    }

    fn to_line_request(&self) -> LineRequest {
        LineRequest {
            menu_item_id: self.menu_item_id.clone(),
            quantity: self.quantity,
            spice_level: Some(self.spice_level),
            notes: self.notes.clone(),
            addon_ids: self.addon_ids.clone(),
        }
    }
}

fn normalize_addons(addon_ids: &[String]) -> Vec<String> {
    let mut ids = addon_ids.to_vec();
    ids.sort();
    ids
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Cart {
    pub entries: Vec<CartEntry>,
    pub table_number: Option<String>,
    pub customer_name: Option<String>,
    pub notes: Option<String>,
}

impl Cart {
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a selection, merging into an identical entry when present.
    /// Returns the id of the entry that now holds it.
    pub fn add_item(&mut self, request: LineRequest, now: DateTime<Utc>) -> CoreResult<String> {
        validate_quantity(request.quantity)?;
        validate_spice_level(request.spice_level.unwrap_or(0))?;
        validate_optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;

        let addon_ids = normalize_addons(&request.addon_ids);

        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|e| e.same_selection(&request, &addon_ids))
        {
            let new_qty = entry.quantity + request.quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(quantity_out_of_range());
            }
            entry.quantity = new_qty;
            return Ok(entry.id.clone());
        }

        if self.entries.len() >= MAX_ORDER_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_ORDER_LINES,
            });
        }

        let entry = CartEntry {
            id: Uuid::new_v4().to_string(),
            menu_item_id: request.menu_item_id,
            quantity: request.quantity,
            spice_level: request.spice_level.unwrap_or(0),
            notes: request.notes,
            addon_ids,
            added_at: now,
        };
        let id = entry.id.clone();
        self.entries.push(entry);
        Ok(id)
    }

    /// Sets an entry's quantity; zero or less removes it.
    pub fn update_quantity(&mut self, entry_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity <= 0 {
            return self.remove_item(entry_id);
        }
        if quantity > MAX_ITEM_QUANTITY {
            return Err(quantity_out_of_range());
        }
        self.entry_mut(entry_id)?.quantity = quantity;
        Ok(())
    }

    pub fn update_spice_level(&mut self, entry_id: &str, level: u8) -> CoreResult<()> {
        validate_spice_level(level)?;
        self.entry_mut(entry_id)?.spice_level = level;
        Ok(())
    }

    pub fn update_notes(&mut self, entry_id: &str, notes: Option<String>) -> CoreResult<()> {
        validate_optional_text("notes", notes.as_deref(), MAX_NOTES_LEN)?;
        self.entry_mut(entry_id)?.notes = notes;
        Ok(())
    }

    pub fn update_addons(&mut self, entry_id: &str, addon_ids: &[String]) -> CoreResult<()> {
        self.entry_mut(entry_id)?.addon_ids = normalize_addons(addon_ids);
        Ok(())
    }

    pub fn remove_item(&mut self, entry_id: &str) -> CoreResult<()> {
        let initial_len = self.entries.len();
        self.entries.retain(|e| e.id != entry_id);

        if self.entries.len() == initial_len {
            Err(CoreError::not_found("CartEntry", entry_id))
        } else {
            Ok(())
        }
    }

    pub fn set_table_number(&mut self, table: Option<String>) -> CoreResult<()> {
        validate_optional_text("table_number", table.as_deref(), MAX_LABEL_LEN)?;
        self.table_number = table;
        Ok(())
    }

    pub fn set_customer_name(&mut self, name: Option<String>) -> CoreResult<()> {
        validate_optional_text("customer_name", name.as_deref(), MAX_LABEL_LEN)?;
        self.customer_name = name;
        Ok(())
    }

    pub fn set_notes(&mut self, notes: Option<String>) -> CoreResult<()> {
        validate_optional_text("notes", notes.as_deref(), MAX_NOTES_LEN)?;
        self.notes = notes;
        Ok(())
    }

    /// Empties the cart, including table and customer.
    pub fn clear(&mut self) {
        *self = Cart::default();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total units across entries.
    pub fn total_quantity(&self) -> i64 {
        self.entries.iter().map(|e| e.quantity).sum()
    }

    /// Prices the cart against the current catalog.
    pub fn preview(
        &self,
        catalog: &Catalog,
        rate: TaxRate,
        policy: AddonPolicy,
    ) -> CoreResult<PricedOrder> {
        let lines: Vec<_> = self.entries.iter().map(CartEntry::to_line_request).collect();
        price_order(&lines, catalog, rate, policy)
    }

    /// Builds the request that places this cart as an order.
    pub fn to_create_request(&self) -> CreateOrderRequest {
        CreateOrderRequest {
            table_number: self.table_number.clone(),
            customer_name: self.customer_name.clone(),
            notes: self.notes.clone(),
            lines: self.entries.iter().map(CartEntry::to_line_request).collect(),
        }
    }

    fn entry_mut(&mut self, entry_id: &str) -> CoreResult<&mut CartEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| CoreError::not_found("CartEntry", entry_id))
    }
}

fn quantity_out_of_range() -> CoreError {
    ValidationError::OutOfRange {
        field: "quantity".to_string(),
        min: 1,
        max: MAX_ITEM_QUANTITY,
    }
    .into()
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::catalog::fixtures::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 4, 0, 0).unwrap()
    }

    #[test]
    fn test_identical_selection_merges() {
        let mut cart = Cart::new();
        let a = cart
            .add_item(LineRequest::new(SOM_TAM, 1).with_addons([DRIED_SHRIMP, SALTED_EGG]), now())
            .unwrap();
        // Same add-ons in another order
        let b = cart
            .add_item(LineRequest::new(SOM_TAM, 2).with_addons([SALTED_EGG, DRIED_SHRIMP]), now())
            .unwrap();

        assert_eq!(a, b);
        assert_eq!(cart.entries.len(), 1);
        assert_eq!(cart.entries[0].quantity, 3);
    }

    #[test]
    fn test_different_spice_or_notes_are_separate() {
        let mut cart = Cart::new();
        cart.add_item(LineRequest::new(SOM_TAM, 1), now()).unwrap();
        cart.add_item(LineRequest::new(SOM_TAM, 1).with_spice_level(5), now())
            .unwrap();
        cart.add_item(LineRequest::new(SOM_TAM, 1).with_notes("no peanuts"), now())
            .unwrap();

        assert_eq!(cart.entries.len(), 3);
        assert_eq!(cart.total_quantity(), 3);
    }

    #[test]
    fn test_update_quantity_zero_removes() {
        let mut cart = Cart::new();
        let id = cart.add_item(LineRequest::new(LARB, 2), now()).unwrap();

        cart.update_quantity(&id, 5).unwrap();
        assert_eq!(cart.entries[0].quantity, 5);

        cart.update_quantity(&id, 0).unwrap();
        assert!(cart.is_empty());
        assert!(matches!(
            cart.update_quantity(&id, 1),
            Err(CoreError::NotFound { .. })
        ));
    }

    #[test]
    fn test_quantity_limit_on_merge() {
        let mut cart = Cart::new();
        cart.add_item(LineRequest::new(LARB, 999), now()).unwrap();
        assert!(matches!(
            cart.add_item(LineRequest::new(LARB, 1), now()),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn test_cart_too_large() {
        let mut cart = Cart::new();
        for i in 0..MAX_ORDER_LINES {
            cart.add_item(LineRequest::new(SOM_TAM, 1).with_notes(format!("seat {i}")), now())
                .unwrap();
        }
        assert_eq!(
            cart.add_item(LineRequest::new(LARB, 1), now()),
            Err(CoreError::CartTooLarge { max: 100 })
        );
    }

    #[test]
    fn test_preview_and_checkout() {
        let mut cart = Cart::new();
        cart.set_table_number(Some("T4".to_string())).unwrap();
        cart.add_item(LineRequest::new(SOM_TAM, 1), now()).unwrap();
        let rice = cart.add_item(LineRequest::new(STICKY_RICE, 1), now()).unwrap();
        cart.update_addons(&rice, &[]).unwrap();

        let priced = cart
            .preview(&catalog(), TaxRate::default(), AddonPolicy::Ignore)
            .unwrap();
        assert_eq!(priced.totals.subtotal_cents, 5500);
        assert_eq!(priced.totals.total_cents, 5500 + 385);

        let request = cart.to_create_request();
        assert_eq!(request.table_number.as_deref(), Some("T4"));
        assert_eq!(request.lines.len(), 2);
        assert!(request.validate().is_ok());

        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.table_number.is_none());
    }
}

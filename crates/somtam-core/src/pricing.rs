//! # Pricing Engine
//!
//! Turns line requests into priced lines and order totals.
//!
//! ## Formula
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line.total  = (menu_item.price + Σ addon.price) × quantity             │
//! │  subtotal    = Σ line.total                                             │
//! │  tax         = subtotal × rate            (integer minor units)         │
//! │  total       = subtotal − discount + tax                                │
//! │                                                                         │
//! │  Example: Som Tam Thai 45.00 × 1, VAT 7%                                │
//! │    subtotal 45.00 → tax 3.15 → total 48.15                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Prices are read from the [`Catalog`] at resolution time and copied into
//! the line. Re-pricing an existing order ([`Totals::for_lines`]) only sums the
//! frozen line totals, so a menu price change never touches a placed order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::catalog::Catalog;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, TaxRate};
use crate::types::{LineAddon, OrderLine};
use crate::validation::{
    validate_optional_text, validate_quantity, validate_spice_level, MAX_NOTES_LEN,
};

// =============================================================================
// Add-on Policy
// =============================================================================

/// What to do with an add-on id the catalog does not know.
///
/// A stale terminal cache is the usual cause, so the default keeps the
/// line and drops the extra. Shops that prefer to bounce the order can
/// switch to `Reject`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AddonPolicy {
    #[default]
    Ignore,
    Reject,
}

impl fmt::Display for AddonPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddonPolicy::Ignore => f.write_str("ignore"),
            AddonPolicy::Reject => f.write_str("reject"),
        }
    }
}

impl FromStr for AddonPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "ignore" => Ok(AddonPolicy::Ignore),
            "reject" => Ok(AddonPolicy::Reject),
            _ => Err(ValidationError::NotAllowed {
                field: "unknown_addon_policy".to_string(),
                allowed: vec!["ignore".to_string(), "reject".to_string()],
            }),
        }
    }
}

// =============================================================================
// Requests
// =============================================================================

/// A line as requested by the terminal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineRequest {
    pub menu_item_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub spice_level: Option<u8>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub addon_ids: Vec<String>,
}

impl LineRequest {
    pub fn new(menu_item_id: impl Into<String>, quantity: i64) -> Self {
        LineRequest {
            menu_item_id: menu_item_id.into(),
            quantity,
            spice_level: None,
            notes: None,
            addon_ids: Vec::new(),
        }
    }

    pub fn with_addons<I, S>(mut self, addon_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.addon_ids = addon_ids.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_spice_level(mut self, level: u8) -> Self {
        self.spice_level = Some(level);
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

// =============================================================================
// Priced Output
// =============================================================================

/// A line resolved against the catalog, with prices frozen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedLine {
    pub menu_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub addons: Vec<LineAddon>,
    pub total_price_cents: i64,
    pub spice_level: u8,
    pub notes: Option<String>,
}

impl PricedLine {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    /// Attaches the line to an order.
    pub fn into_order_line(self, order_id: &str, now: DateTime<Utc>) -> OrderLine {
        OrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            menu_item_id: self.menu_item_id,
            name_snapshot: self.name,
            quantity: self.quantity,
            unit_price_cents: self.unit_price_cents,
            addons: self.addons,
            total_price_cents: self.total_price_cents,
            spice_level: self.spice_level,
            notes: self.notes,
            created_at: now,
        }
    }
}

/// Derived monetary fields of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Totals {
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    pub discount_cents: i64,
    pub total_cents: i64,
}

impl Totals {
    /// Computes tax and total from a subtotal.
    ///
    /// Tax is charged on the subtotal; the discount only reduces the total.
    pub fn compute(subtotal: Money, discount: Money, rate: TaxRate) -> Self {
        let tax = subtotal.calculate_tax(rate);
        let total = subtotal - discount + tax;
        Totals {
            subtotal_cents: subtotal.cents(),
            tax_cents: tax.cents(),
            discount_cents: discount.cents(),
            total_cents: total.cents(),
        }
    }

    /// Re-prices from the frozen totals of existing lines.
    pub fn for_lines(lines: &[OrderLine], discount: Money, rate: TaxRate) -> Self {
        let subtotal: Money = lines.iter().map(OrderLine::total_price).sum();
        Totals::compute(subtotal, discount, rate)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

/// Result of [`price_order`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub totals: Totals,
}

// =============================================================================
// Operations
// =============================================================================

/// Resolves and prices a single line.
///
/// ## Errors
/// - `Validation` for a bad quantity, spice level or oversized notes
/// - `UnknownMenuItem` when the menu item is not in the catalog
/// - `UnknownAddon` for a missing add-on under [`AddonPolicy::Reject`]
pub fn price_line(
    request: &LineRequest,
    catalog: &Catalog,
    policy: AddonPolicy,
) -> CoreResult<PricedLine> {
    validate_quantity(request.quantity)?;
    let spice_level = request.spice_level.unwrap_or(0);
    validate_spice_level(spice_level)?;
    validate_optional_text("notes", request.notes.as_deref(), MAX_NOTES_LEN)?;

    let menu_item = catalog
        .menu_item(&request.menu_item_id)
        .ok_or_else(|| CoreError::UnknownMenuItem(request.menu_item_id.clone()))?;

    let mut addons = Vec::with_capacity(request.addon_ids.len());
    for addon_id in &request.addon_ids {
        match catalog.addon(addon_id) {
            Some(addon) => addons.push(LineAddon {
                addon_id: addon.id.clone(),
                name: addon.name.clone(),
                price_cents: addon.price_cents,
            }),
            None if policy == AddonPolicy::Reject => {
                return Err(CoreError::UnknownAddon(addon_id.clone()));
            }
            None => {}
        }
    }

    let addons_price: Money = addons
        .iter()
        .map(|a| Money::from_cents(a.price_cents))
        .sum();
    let total = (menu_item.price() + addons_price).multiply_quantity(request.quantity);

    Ok(PricedLine {
        menu_item_id: menu_item.id.clone(),
        name: menu_item.name.clone(),
        quantity: request.quantity,
        unit_price_cents: menu_item.price_cents,
        addons,
        total_price_cents: total.cents(),
        spice_level,
        notes: request.notes.clone(),
    })
}

/// Prices a full set of lines. Discount starts at zero.
///
/// Pure: the caller persists the result.
pub fn price_order(
    requests: &[LineRequest],
    catalog: &Catalog,
    rate: TaxRate,
    policy: AddonPolicy,
) -> CoreResult<PricedOrder> {
    let lines = requests
        .iter()
        .map(|r| price_line(r, catalog, policy))
        .collect::<CoreResult<Vec<_>>>()?;

    let subtotal: Money = lines.iter().map(PricedLine::total_price).sum();
    let totals = Totals::compute(subtotal, Money::zero(), rate);

    Ok(PricedOrder { lines, totals })
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # In-Memory Store
//!
//! [`Store`] kept entirely in process: the client-local deployment (a
//! single tablet with no database file) and the services' test double.
//!
//! All state sits behind one `tokio::sync::Mutex`, so every trait method
//! is atomic with respect to every other one. Integrity rules mirror the
//! SQLite schema: unknown category or add-on on a menu item is `Rejected`,
//! a duplicate order number or a second completed payment is `Conflict`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

use somtam_core::{
    Addon, Catalog, Category, DailyStat, DailyStatDelta, MenuItem, Order, OrderFilter, Payment,
    PaymentFilter, PaymentState,
};
use somtam_db::repository::payment::COMPLETED_PAYMENT;

use super::Store;
use crate::error::{StoreError, StoreResult};

#[derive(Debug, Default)]
struct State {
    categories: HashMap<String, Category>,
    menu_items: HashMap<String, MenuItem>,
    addons: HashMap<String, Addon>,
    orders: HashMap<String, Order>,
    sequences: HashMap<NaiveDate, i64>,
    payments: HashMap<String, Payment>,
    settings: HashMap<String, String>,
    daily_stats: BTreeMap<NaiveDate, DailyStat>,
}

impl State {
    fn order_mut(&mut self, id: &str) -> StoreResult<&mut Order> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| StoreError::not_found("Order", id))
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    // =========================================================================
    // Catalog
    // =========================================================================

    async fn list_categories(&self, include_inactive: bool) -> StoreResult<Vec<Category>> {
        let state = self.state.lock().await;
        let mut categories: Vec<Category> = state
            .categories
            .values()
            .filter(|c| include_inactive || c.is_active)
            .cloned()
            .collect();
        categories.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then_with(|| a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn get_category(&self, id: &str) -> StoreResult<Option<Category>> {
        Ok(self.state.lock().await.categories.get(id).cloned())
    }

    async fn save_category(&self, category: &Category) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.categories.insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn deactivate_category(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.categories.get_mut(id) {
            Some(category) => {
                category.is_active = false;
                true
            }
            None => false,
        })
    }

    async fn list_menu_items(&self, category_id: Option<&str>) -> StoreResult<Vec<MenuItem>> {
        let state = self.state.lock().await;
        let mut items: Vec<MenuItem> = state
            .menu_items
            .values()
            .filter(|m| category_id.map_or(true, |c| m.category_id == c))
            .cloned()
            .collect();
        items.sort_by(|a, b| b.is_popular.cmp(&a.is_popular).then_with(|| a.name.cmp(&b.name)));
        Ok(items)
    }

    async fn get_menu_item(&self, id: &str) -> StoreResult<Option<MenuItem>> {
        Ok(self.state.lock().await.menu_items.get(id).cloned())
    }

    async fn save_menu_item(&self, item: &MenuItem) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if !state.categories.contains_key(&item.category_id) {
            return Err(StoreError::Rejected(format!(
                "unknown category {}",
                item.category_id
            )));
        }
        if let Some(missing) = item.addon_ids.iter().find(|id| !state.addons.contains_key(*id)) {
            return Err(StoreError::Rejected(format!("unknown add-on {missing}")));
        }

        let mut stored = item.clone();
        stored.addon_ids.sort();
        stored.addon_ids.dedup();
        if let Some(existing) = state.menu_items.get(&item.id) {
            stored.created_at = existing.created_at;
        }
        state.menu_items.insert(stored.id.clone(), stored);
        Ok(())
    }

    async fn delete_menu_item(&self, id: &str) -> StoreResult<bool> {
        Ok(self.state.lock().await.menu_items.remove(id).is_some())
    }

    async fn set_menu_item_availability(
        &self,
        id: &str,
        available: bool,
        now: DateTime<Utc>,
    ) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.menu_items.get_mut(id) {
            Some(item) => {
                item.is_available = available;
                item.updated_at = now;
                true
            }
            None => false,
        })
    }

    async fn list_addons(&self, include_inactive: bool) -> StoreResult<Vec<Addon>> {
        let state = self.state.lock().await;
        let mut addons: Vec<Addon> = state
            .addons
            .values()
            .filter(|a| include_inactive || a.is_active)
            .cloned()
            .collect();
        addons.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(addons)
    }

    async fn get_addon(&self, id: &str) -> StoreResult<Option<Addon>> {
        Ok(self.state.lock().await.addons.get(id).cloned())
    }

    async fn save_addon(&self, addon: &Addon) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.addons.insert(addon.id.clone(), addon.clone());
        Ok(())
    }

    async fn deactivate_addon(&self, id: &str) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.addons.get_mut(id) {
            Some(addon) => {
                addon.is_active = false;
                true
            }
            None => false,
        })
    }

    async fn load_catalog(&self) -> StoreResult<Catalog> {
        let state = self.state.lock().await;
        Ok(Catalog::new(
            state.menu_items.values().cloned(),
            state.addons.values().cloned(),
            state.categories.values().cloned(),
        ))
    }

    // =========================================================================
    // Orders
    // =========================================================================

    async fn next_order_sequence(&self, date: NaiveDate) -> StoreResult<i64> {
        let mut state = self.state.lock().await;
        let last = state.sequences.entry(date).or_insert(0);
        *last += 1;
        Ok(*last)
    }

    async fn insert_order(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if state.orders.contains_key(&order.id) {
            return Err(StoreError::Conflict(format!("duplicate order id {}", order.id)));
        }
        if state
            .orders
            .values()
            .any(|o| o.order_number == order.order_number)
        {
            return Err(StoreError::Conflict(format!(
                "duplicate order number {}",
                order.order_number
            )));
        }

        state.orders.insert(order.id.clone(), order.clone());
        Ok(())
    }

    async fn save_order(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        *state.order_mut(&order.id)? = order.clone();
        Ok(())
    }

    async fn save_order_header(&self, order: &Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let stored = state.order_mut(&order.id)?;
        let lines = std::mem::take(&mut stored.lines);
        *stored = Order {
            lines,
            ..order.clone()
        };
        Ok(())
    }

    async fn get_order(&self, id: &str) -> StoreResult<Option<Order>> {
        Ok(self.state.lock().await.orders.get(id).cloned())
    }

    async fn list_orders(&self, filter: &OrderFilter) -> StoreResult<Vec<Order>> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| filter.matches(o))
            .cloned()
            .collect();
        filter.arrange(&mut orders);
        Ok(orders)
    }

    // =========================================================================
    // Payments
    // =========================================================================

    async fn settle_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        if !state.orders.contains_key(&order.id) {
            return Err(StoreError::not_found("Order", &order.id));
        }
        if state.payments.values().any(|p| {
            p.order_id == payment.order_id && p.status == PaymentState::Completed
        }) {
            return Err(StoreError::Conflict(format!(
                "order {} already has a completed payment",
                payment.order_id
            )));
        }
        if state.payments.contains_key(&payment.id) {
            return Err(StoreError::Conflict(format!("duplicate payment id {}", payment.id)));
        }

        state.payments.insert(payment.id.clone(), payment.clone());
        let stored = state.order_mut(&order.id)?;
        let lines = std::mem::take(&mut stored.lines);
        *stored = Order {
            lines,
            ..order.clone()
        };
        Ok(())
    }

    async fn refund_payment(&self, payment: &Payment, order: &Order) -> StoreResult<()> {
        let mut state = self.state.lock().await;

        let completed = state
            .payments
            .get(&payment.id)
            .is_some_and(|p| p.status == PaymentState::Completed);
        if !completed {
            return Err(StoreError::not_found(COMPLETED_PAYMENT, &payment.id));
        }
        if !state.orders.contains_key(&order.id) {
            return Err(StoreError::not_found("Order", &order.id));
        }

        state.payments.insert(payment.id.clone(), payment.clone());
        let stored = state.order_mut(&order.id)?;
        let lines = std::mem::take(&mut stored.lines);
        *stored = Order {
            lines,
            ..order.clone()
        };
        Ok(())
    }

    async fn get_payment(&self, id: &str) -> StoreResult<Option<Payment>> {
        Ok(self.state.lock().await.payments.get(id).cloned())
    }

    async fn list_payments(&self, filter: &PaymentFilter) -> StoreResult<Vec<Payment>> {
        let state = self.state.lock().await;
        let mut payments: Vec<Payment> = state
            .payments
            .values()
            .filter(|p| filter.matches(p))
            .cloned()
            .collect();
        payments.sort_by_key(|p| p.created_at);
        Ok(payments)
    }

    // =========================================================================
    // Settings
    // =========================================================================

    async fn get_settings(&self) -> StoreResult<HashMap<String, String>> {
        Ok(self.state.lock().await.settings.clone())
    }

    async fn put_settings(&self, pairs: &[(String, String)], _now: DateTime<Utc>) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        for (key, value) in pairs {
            state.settings.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn delete_setting(&self, key: &str) -> StoreResult<bool> {
        Ok(self.state.lock().await.settings.remove(key).is_some())
    }

    // =========================================================================
    // Daily aggregate
    // =========================================================================

    async fn bump_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let stat = state
            .daily_stats
            .entry(date)
            .or_insert_with(|| DailyStat::empty(date));
        add(stat, delta);
        Ok(())
    }

    async fn apply_daily_stat(&self, date: NaiveDate, delta: DailyStatDelta) -> StoreResult<bool> {
        let mut state = self.state.lock().await;
        Ok(match state.daily_stats.get_mut(&date) {
            Some(stat) => {
                add(stat, delta);
                true
            }
            None => false,
        })
    }

    async fn put_daily_stat(&self, stat: &DailyStat) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        state.daily_stats.insert(stat.date, stat.clone());
        Ok(())
    }

    async fn get_daily_stat(&self, date: NaiveDate) -> StoreResult<Option<DailyStat>> {
        Ok(self.state.lock().await.daily_stats.get(&date).cloned())
    }

    async fn list_daily_stats(&self, from: NaiveDate, to: NaiveDate) -> StoreResult<Vec<DailyStat>> {
        if from > to {
            return Ok(Vec::new());
        }
        let state = self.state.lock().await;
        Ok(state.daily_stats.range(from..=to).map(|(_, s)| s.clone()).collect())
    }
}

fn add(stat: &mut DailyStat, delta: DailyStatDelta) {
    stat.total_orders += delta.orders;
    stat.total_revenue_cents += delta.revenue_cents;
    stat.total_items += delta.items;
}

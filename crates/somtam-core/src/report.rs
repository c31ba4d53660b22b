//! # Reporting
//!
//! Dashboard folds over order and payment history.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Store ──► orders / payments in a DateRange ──► fold ──► report value  │
//! │                                                                         │
//! │   ReportClock pins "today" and the shop's UTC offset so every fold     │
//! │   buckets by the shop's local calendar, not the server's.               │
//! │                                                                         │
//! │   overview          today vs yesterday, non-cancelled orders           │
//! │   today_summary     counts by status, paid revenue, unpaid amount      │
//! │   hourly_sales      24 buckets, today's paid orders                    │
//! │   daily_sales       one bucket per day (empty days included)           │
//! │   top_items         by quantity, non-cancelled                         │
//! │   category_breakdown by revenue, non-cancelled                         │
//! │   payment_breakdown completed payments per method                      │
//! │   daily_stat_for    rebuild one DailyStat row                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every fold filters its input again, so callers may over-fetch.

use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use ts_rs::TS;

use crate::catalog::Catalog;
use crate::types::{DailyStat, Order, OrderStatus, Payment, PaymentMethod, PaymentState, PaymentStatus};

/// Days covered by `daily_sales` when the caller does not say.
pub const DEFAULT_DAILY_SALES_DAYS: u32 = 7;

/// Days covered by the item and category rankings by default.
pub const DEFAULT_RANKING_DAYS: u32 = 30;

/// Rows returned by `top_items` / `recent_orders` by default.
pub const DEFAULT_LIMIT: usize = 10;

// =============================================================================
// Clock and Ranges
// =============================================================================

/// Half-open UTC interval `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DateRange {
    #[ts(as = "String")]
    pub start: DateTime<Utc>,
    #[ts(as = "String")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange { start, end }
    }

    #[inline]
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        ts >= self.start && ts < self.end
    }
}

/// "Today" in the shop's timezone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportClock {
    pub today: NaiveDate,
    pub offset: FixedOffset,
}

impl ReportClock {
    pub fn new(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        ReportClock {
            today: now.with_timezone(&offset).date_naive(),
            offset,
        }
    }

    /// Local calendar date of an instant.
    pub fn local_date(&self, ts: DateTime<Utc>) -> NaiveDate {
        ts.with_timezone(&self.offset).date_naive()
    }

    /// Local hour (0-23) of an instant.
    pub fn local_hour(&self, ts: DateTime<Utc>) -> u32 {
        ts.with_timezone(&self.offset).hour()
    }

    /// Local midnight of `date`, as UTC.
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        let local = date.and_time(NaiveTime::MIN);
        (local - self.offset).and_utc()
    }

    /// The whole local day `date`.
    pub fn day(&self, date: NaiveDate) -> DateRange {
        let next = date.checked_add_days(Days::new(1)).unwrap_or(date);
        DateRange::new(self.day_start(date), self.day_start(next))
    }

    pub fn today_range(&self) -> DateRange {
        self.day(self.today)
    }

    pub fn yesterday(&self) -> NaiveDate {
        self.today
            .checked_sub_days(Days::new(1))
            .unwrap_or(self.today)
    }

    /// The last `days` local days, today included.
    pub fn trailing(&self, days: u32) -> DateRange {
        let days = days.max(1);
        let first = self
            .today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(self.today);
        DateRange::new(self.day_start(first), self.today_range().end)
    }
}

// =============================================================================
// Report Types
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StatusCounts {
    pub pending: i64,
    pub preparing: i64,
    pub ready: i64,
    pub completed: i64,
}

impl StatusCounts {
    fn count(&mut self, status: OrderStatus) {
        match status {
            OrderStatus::Pending => self.pending += 1,
            OrderStatus::Preparing => self.preparing += 1,
            OrderStatus::Ready => self.ready += 1,
            OrderStatus::Completed => self.completed += 1,
            OrderStatus::Cancelled => {}
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DaySnapshot {
    pub orders: i64,
    pub revenue_cents: i64,
    pub avg_order_value_cents: i64,
    pub by_status: StatusCounts,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Comparison {
    /// Percent change in order count vs yesterday, one decimal.
    pub orders_change: f64,
    /// Percent change in paid revenue vs yesterday, one decimal.
    pub revenue_change: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Overview {
    pub today: DaySnapshot,
    pub comparison: Comparison,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TodaySummary {
    pub total_orders: i64,
    pub by_status: StatusCounts,
    pub total_revenue_cents: i64,
    pub unpaid_amount_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct HourlyBucket {
    pub hour: u32,
    pub orders: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailyBucket {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub orders: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemSales {
    pub menu_item_id: String,
    pub name: String,
    pub category: Option<String>,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CategorySales {
    pub category_id: String,
    pub name: String,
    pub icon: Option<String>,
    pub quantity: i64,
    pub revenue_cents: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MethodTotals {
    pub count: i64,
    pub amount_cents: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentBreakdown {
    pub cash: MethodTotals,
    pub promptpay: MethodTotals,
    pub credit_card: MethodTotals,
}

impl PaymentBreakdown {
    pub fn get(&self, method: PaymentMethod) -> MethodTotals {
        match method {
            PaymentMethod::Cash => self.cash,
            PaymentMethod::Promptpay => self.promptpay,
            PaymentMethod::CreditCard => self.credit_card,
        }
    }

    fn slot(&mut self, method: PaymentMethod) -> &mut MethodTotals {
        match method {
            PaymentMethod::Cash => &mut self.cash,
            PaymentMethod::Promptpay => &mut self.promptpay,
            PaymentMethod::CreditCard => &mut self.credit_card,
        }
    }
}

// =============================================================================
// Folds
// =============================================================================

fn percent_change(today: i64, yesterday: i64) -> f64 {
    if yesterday == 0 {
        return 0.0;
    }
    let raw = (today - yesterday) as f64 / yesterday as f64 * 100.0;
    (raw * 10.0).round() / 10.0
}

fn snapshot<'a>(orders: impl Iterator<Item = &'a Order>) -> DaySnapshot {
    let mut snap = DaySnapshot::default();
    for order in orders {
        snap.orders += 1;
        snap.by_status.count(order.status);
        if order.payment_status == PaymentStatus::Paid {
            snap.revenue_cents += order.total_cents;
        }
    }
    if snap.orders > 0 {
        snap.avg_order_value_cents = snap.revenue_cents / snap.orders;
    }
    snap
}

fn not_cancelled_in<'a>(
    orders: &'a [Order],
    range: DateRange,
) -> impl Iterator<Item = &'a Order> + 'a {
    orders
        .iter()
        .filter(move |o| range.contains(o.created_at) && o.status != OrderStatus::Cancelled)
}

/// Today's non-cancelled orders against yesterday's.
pub fn overview(clock: &ReportClock, orders: &[Order]) -> Overview {
    let today = snapshot(not_cancelled_in(orders, clock.today_range()));
    let yesterday = snapshot(not_cancelled_in(orders, clock.day(clock.yesterday())));

    Overview {
        comparison: Comparison {
            orders_change: percent_change(today.orders, yesterday.orders),
            revenue_change: percent_change(today.revenue_cents, yesterday.revenue_cents),
        },
        today,
    }
}

pub fn today_summary(clock: &ReportClock, orders: &[Order]) -> TodaySummary {
    let mut summary = TodaySummary::default();
    for order in not_cancelled_in(orders, clock.today_range()) {
        summary.total_orders += 1;
        summary.by_status.count(order.status);
        match order.payment_status {
            PaymentStatus::Paid => summary.total_revenue_cents += order.total_cents,
            PaymentStatus::Unpaid => summary.unpaid_amount_cents += order.total_cents,
            PaymentStatus::Refunded => {}
        }
    }
    summary
}

/// Today's paid orders by local hour of creation.
pub fn hourly_sales(clock: &ReportClock, orders: &[Order]) -> Vec<HourlyBucket> {
    let mut buckets: Vec<HourlyBucket> = (0..24)
        .map(|hour| HourlyBucket {
            hour,
            ..HourlyBucket::default()
        })
        .collect();

    let range = clock.today_range();
    for order in orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid && range.contains(o.created_at))
    {
        let bucket = &mut buckets[clock.local_hour(order.created_at) as usize];
        bucket.orders += 1;
        bucket.revenue_cents += order.total_cents;
    }
    buckets
}

/// Paid orders per local day over the last `days` days, oldest first.
pub fn daily_sales(clock: &ReportClock, days: u32, orders: &[Order]) -> Vec<DailyBucket> {
    let days = days.max(1);
    let range = clock.trailing(days);
    let first = clock.local_date(range.start);

    let mut buckets: Vec<DailyBucket> = (0..days)
        .filter_map(|i| first.checked_add_days(Days::new(u64::from(i))))
        .map(|date| DailyBucket {
            date,
            orders: 0,
            revenue_cents: 0,
        })
        .collect();

    for order in orders
        .iter()
        .filter(|o| o.payment_status == PaymentStatus::Paid && range.contains(o.created_at))
    {
        let date = clock.local_date(order.created_at);
        if let Some(bucket) = buckets.iter_mut().find(|b| b.date == date) {
            bucket.orders += 1;
            bucket.revenue_cents += order.total_cents;
        }
    }
    buckets
}

/// Best sellers by quantity over non-cancelled orders in `range`.
///
/// A menu item deleted since falls back to the name on the line.
pub fn top_items(range: DateRange, orders: &[Order], catalog: &Catalog, limit: usize) -> Vec<ItemSales> {
    let mut stats: HashMap<&str, ItemSales> = HashMap::new();

    for line in not_cancelled_in(orders, range).flat_map(|o| o.lines.iter()) {
        let entry = stats.entry(line.menu_item_id.as_str()).or_insert_with(|| {
            let item = catalog.menu_item(&line.menu_item_id);
            ItemSales {
                menu_item_id: line.menu_item_id.clone(),
                name: item
                    .map(|m| m.name.clone())
                    .unwrap_or_else(|| line.name_snapshot.clone()),
                category: catalog.category_of(&line.menu_item_id).map(|c| c.name.clone()),
                quantity: 0,
                revenue_cents: 0,
            }
        });
        entry.quantity += line.quantity;
        entry.revenue_cents += line.total_price_cents;
    }

    let mut items: Vec<ItemSales> = stats.into_values().collect();
    items.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    items.truncate(limit);
    items
}

/// Sales per category by revenue over non-cancelled orders in `range`.
///
/// Lines whose menu item or category no longer exists are skipped.
pub fn category_breakdown(
    range: DateRange,
    orders: &[Order],
    catalog: &Catalog,
    limit: usize,
) -> Vec<CategorySales> {
    let mut stats: HashMap<String, CategorySales> = HashMap::new();

    for line in not_cancelled_in(orders, range).flat_map(|o| o.lines.iter()) {
        let Some(category) = catalog.category_of(&line.menu_item_id) else {
            continue;
        };
        let entry = stats
            .entry(category.id.clone())
            .or_insert_with(|| CategorySales {
                category_id: category.id.clone(),
                name: category.name.clone(),
                icon: category.icon.clone(),
                quantity: 0,
                revenue_cents: 0,
            });
        entry.quantity += line.quantity;
        entry.revenue_cents += line.total_price_cents;
    }

    let mut categories: Vec<CategorySales> = stats.into_values().collect();
    categories.sort_by(|a, b| {
        b.revenue_cents
            .cmp(&a.revenue_cents)
            .then_with(|| a.name.cmp(&b.name))
    });
    categories.truncate(limit);
    categories
}

/// Completed payments per method in `range`.
pub fn payment_breakdown(range: DateRange, payments: &[Payment]) -> PaymentBreakdown {
    let mut breakdown = PaymentBreakdown::default();
    for payment in payments
        .iter()
        .filter(|p| p.status == PaymentState::Completed && range.contains(p.created_at))
    {
        let slot = breakdown.slot(payment.method);
        slot.count += 1;
        slot.amount_cents += payment.amount_cents;
    }
    breakdown
}

/// Recomputes the cached aggregate of one local day from completed payments.
pub fn daily_stat_for(
    clock: &ReportClock,
    date: NaiveDate,
    payments: &[Payment],
    orders: &[Order],
) -> DailyStat {
    let by_id: HashMap<&str, &Order> = orders.iter().map(|o| (o.id.as_str(), o)).collect();
    let mut stat = DailyStat::empty(date);

    for payment in payments
        .iter()
        .filter(|p| p.status == PaymentState::Completed && clock.local_date(p.created_at) == date)
    {
        stat.total_orders += 1;
        stat.total_revenue_cents += payment.amount_cents;
        if let Some(order) = by_id.get(payment.order_id.as_str()) {
            stat.total_items += order.item_count();
        }
    }
    stat
}

/// Kitchen queue: pending, preparing and ready orders, oldest first.
pub fn active_orders(orders: Vec<Order>) -> Vec<Order> {
    let mut active: Vec<Order> = orders.into_iter().filter(|o| o.status.is_active()).collect();
    active.sort_by_key(|o| o.created_at);
    active
}

/// Latest orders, newest first.
pub fn recent_orders(mut orders: Vec<Order>, limit: usize) -> Vec<Order> {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    orders.truncate(limit);
    orders
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::catalog::fixtures::*;
    use crate::order::testing::place;
    use crate::pricing::LineRequest;

    /// Bangkok, UTC+7.
    fn clock() -> ReportClock {
        let offset = FixedOffset::east_opt(7 * 3600).unwrap();
        // 2026-10-16 14:00 local
        ReportClock::new(Utc.with_ymd_and_hms(2026, 10, 16, 7, 0, 0).unwrap(), offset)
    }

    /// Instant at `hour` local time, `days_ago` days before today.
    fn local(days_ago: u64, hour: u32) -> DateTime<Utc> {
        let c = clock();
        let date = c.today.checked_sub_days(Days::new(days_ago)).unwrap();
        c.day_start(date) + Duration::hours(i64::from(hour))
    }

    fn order_at(ts: DateTime<Utc>, lines: Vec<LineRequest>, paid: bool) -> Order {
        let mut order = place(lines, ts);
        if paid {
            order.payment_status = PaymentStatus::Paid;
        }
        order
    }

    fn som_tam_at(ts: DateTime<Utc>, paid: bool) -> Order {
        order_at(ts, vec![LineRequest::new(SOM_TAM, 1)], paid)
    }

    #[test]
    fn test_clock_uses_local_calendar() {
        let c = clock();
        assert_eq!(c.today, NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        // 23:30 UTC on the 15th is 06:30 local on the 16th
        let ts = Utc.with_ymd_and_hms(2026, 10, 15, 23, 30, 0).unwrap();
        assert_eq!(c.local_date(ts), c.today);
        assert_eq!(c.local_hour(ts), 6);
        assert_eq!(
            c.today_range().start,
            Utc.with_ymd_and_hms(2026, 10, 15, 17, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_daily_sales_includes_empty_days() {
        let orders = vec![
            som_tam_at(local(0, 12), true),
            som_tam_at(local(0, 13), true),
            som_tam_at(local(2, 19), true),
            som_tam_at(local(6, 11), true),
            // Outside the window, unpaid
            som_tam_at(local(7, 11), true),
            som_tam_at(local(1, 11), false),
        ];

        let buckets = daily_sales(&clock(), DEFAULT_DAILY_SALES_DAYS, &orders);

        assert_eq!(buckets.len(), 7);
        assert_eq!(buckets[0].date, NaiveDate::from_ymd_opt(2026, 10, 10).unwrap());
        assert_eq!(buckets[6].date, clock().today);
        let counts: Vec<i64> = buckets.iter().map(|b| b.orders).collect();
        assert_eq!(counts, vec![1, 0, 0, 0, 1, 0, 2]);
        assert_eq!(buckets[6].revenue_cents, 2 * 4815);
        assert_eq!(buckets[5].revenue_cents, 0);
    }

    #[test]
    fn test_overview_compares_with_yesterday() {
        let mut cancelled = som_tam_at(local(0, 9), false);
        cancelled.status = OrderStatus::Cancelled;
        let mut preparing = som_tam_at(local(0, 10), false);
        preparing.status = OrderStatus::Preparing;

        let orders = vec![
            som_tam_at(local(0, 9), true),
            som_tam_at(local(0, 11), true),
            preparing,
            cancelled,
            som_tam_at(local(1, 9), true),
            som_tam_at(local(1, 10), true),
        ];
        let overview = overview(&clock(), &orders);

        assert_eq!(overview.today.orders, 3);
        assert_eq!(overview.today.revenue_cents, 2 * 4815);
        assert_eq!(overview.today.avg_order_value_cents, 2 * 4815 / 3);
        assert_eq!(overview.today.by_status.pending, 2);
        assert_eq!(overview.today.by_status.preparing, 1);
        assert_eq!(overview.comparison.orders_change, 50.0);
        assert_eq!(overview.comparison.revenue_change, 0.0);
    }

    #[test]
    fn test_percent_change() {
        assert_eq!(percent_change(5, 0), 0.0);
        assert_eq!(percent_change(1, 3), -66.7);
        assert_eq!(percent_change(4, 3), 33.3);
    }

    #[test]
    fn test_today_summary() {
        let orders = vec![som_tam_at(local(0, 9), true), som_tam_at(local(0, 10), false)];
        let summary = today_summary(&clock(), &orders);

        assert_eq!(summary.total_orders, 2);
        assert_eq!(summary.total_revenue_cents, 4815);
        assert_eq!(summary.unpaid_amount_cents, 4815);
    }

    #[test]
    fn test_hourly_sales() {
        let orders = vec![
            som_tam_at(local(0, 12), true),
            som_tam_at(local(0, 12), true),
            som_tam_at(local(0, 18), true),
            som_tam_at(local(0, 18), false),
        ];
        let buckets = hourly_sales(&clock(), &orders);

        assert_eq!(buckets.len(), 24);
        assert_eq!(buckets[12].orders, 2);
        assert_eq!(buckets[18].orders, 1);
        assert_eq!(buckets[0].orders, 0);
    }

    #[test]
    fn test_top_items_and_categories() {
        // Menu item removed from the catalog after the order was placed
        let mut orphan = som_tam_at(local(3, 12), false);
        orphan.lines[0].menu_item_id = "deleted-item".to_string();

        let orders = vec![
            order_at(
                local(1, 12),
                vec![LineRequest::new(SOM_TAM, 2), LineRequest::new(STICKY_RICE, 3)],
                true,
            ),
            order_at(local(3, 12), vec![LineRequest::new(LARB, 1)], false),
            orphan,
        ];
        let range = clock().trailing(DEFAULT_RANKING_DAYS);
        let catalog = catalog();

        let top = top_items(range, &orders, &catalog, 2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "Sticky Rice");
        assert_eq!(top[0].quantity, 3);
        assert_eq!(top[0].category.as_deref(), Some("Rice"));
        assert_eq!(top[1].name, "Som Tam Thai");

        let categories = category_breakdown(range, &orders, &catalog, DEFAULT_LIMIT);
        assert_eq!(categories.len(), 2);
        assert_eq!(categories[0].category_id, CAT_SALAD);
        assert_eq!(categories[0].revenue_cents, 9000 + 6000);
        assert_eq!(categories[1].quantity, 3);

        let leader = category_breakdown(range, &orders, &catalog, 1);
        assert_eq!(leader.len(), 1);
        assert_eq!(leader[0].category_id, CAT_SALAD);
    }

    fn payment(id: &str, order: &Order, method: PaymentMethod, state: PaymentState) -> Payment {
        Payment {
            id: id.to_string(),
            order_id: order.id.clone(),
            amount_cents: order.total_cents,
            method,
            received_cents: Some(order.total_cents),
            change_cents: 0,
            transaction_id: None,
            status: state,
            refund_reason: None,
            created_at: order.created_at,
            refunded_at: None,
        }
    }

    #[test]
    fn test_payment_breakdown_counts_completed_only() {
        let a = som_tam_at(local(0, 9), true);
        let b = som_tam_at(local(0, 10), true);
        let payments = vec![
            payment("p1", &a, PaymentMethod::Cash, PaymentState::Completed),
            payment("p2", &b, PaymentMethod::Promptpay, PaymentState::Completed),
            payment("p3", &b, PaymentMethod::Cash, PaymentState::Refunded),
        ];
        let breakdown = payment_breakdown(clock().today_range(), &payments);

        assert_eq!(breakdown.get(PaymentMethod::Cash).count, 1);
        assert_eq!(breakdown.promptpay.amount_cents, 4815);
        assert_eq!(breakdown.credit_card, MethodTotals::default());
    }

    #[test]
    fn test_daily_stat_for_date() {
        let a = order_at(local(0, 9), vec![LineRequest::new(SOM_TAM, 2)], true);
        let b = som_tam_at(local(0, 10), true);
        let c = som_tam_at(local(1, 10), true);
        let payments = vec![
            payment("p1", &a, PaymentMethod::Cash, PaymentState::Completed),
            payment("p2", &b, PaymentMethod::Cash, PaymentState::Refunded),
            payment("p3", &c, PaymentMethod::Cash, PaymentState::Completed),
        ];

        let stat = daily_stat_for(&clock(), clock().today, &payments, &[a.clone(), b, c]);
        assert_eq!(stat.total_orders, 1);
        assert_eq!(stat.total_revenue_cents, a.total_cents);
        assert_eq!(stat.total_items, 2);
    }

    #[test]
    fn test_active_and_recent_orders() {
        let mut done = som_tam_at(local(0, 8), true);
        done.status = OrderStatus::Completed;
        let early = som_tam_at(local(0, 9), false);
        let late = som_tam_at(local(0, 11), false);

        let active = active_orders(vec![late.clone(), done.clone(), early.clone()]);
        assert_eq!(
            active.iter().map(|o| o.id.as_str()).collect::<Vec<_>>(),
            vec![early.id.as_str(), late.id.as_str()]
        );

        let recent = recent_orders(vec![early.clone(), done, late.clone()], 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].id, late.id);
    }
}

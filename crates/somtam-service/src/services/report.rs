//! # Report Service
//!
//! Loads the orders or payments a report needs from the store and folds
//! them with [`somtam_core::report`]. Windows are local calendar days in
//! the shop's timezone.
//!
//! ```text
//! store.list_orders(window) ──► report::daily_sales(clock, days, orders)
//!                                        │
//!                                        ▼
//!                         [ { date, orders, revenue_cents }, ... ]
//! ```

use chrono::{Days, NaiveDate};
use tracing::debug;

use somtam_core::report::{
    self, CategorySales, DailyBucket, DateRange, HourlyBucket, ItemSales, Overview,
    PaymentBreakdown, TodaySummary, DEFAULT_DAILY_SALES_DAYS, DEFAULT_LIMIT, DEFAULT_RANKING_DAYS,
};
use somtam_core::{DailyStat, Order, OrderFilter, OrderStatus, PaymentFilter};

use super::ServiceContext;
use crate::error::ServiceResult;

/// Widest window a report accepts.
pub const MAX_REPORT_DAYS: u32 = 366;

#[derive(Clone)]
pub struct ReportService {
    ctx: ServiceContext,
}

impl ReportService {
    pub fn new(ctx: ServiceContext) -> Self {
        ReportService { ctx }
    }

    async fn orders_in(&self, range: DateRange) -> ServiceResult<Vec<Order>> {
        Ok(self
            .ctx
            .store()
            .list_orders(&OrderFilter::created_in(range))
            .await?)
    }

    /// Today against yesterday.
    pub async fn overview(&self) -> ServiceResult<Overview> {
        let clock = self.ctx.report_clock();
        let range = DateRange::new(clock.day_start(clock.yesterday()), clock.today_range().end);
        let orders = self.orders_in(range).await?;
        Ok(report::overview(&clock, &orders))
    }

    pub async fn today_summary(&self) -> ServiceResult<TodaySummary> {
        let clock = self.ctx.report_clock();
        let orders = self.orders_in(clock.today_range()).await?;
        Ok(report::today_summary(&clock, &orders))
    }

    pub async fn hourly_sales(&self) -> ServiceResult<Vec<HourlyBucket>> {
        let clock = self.ctx.report_clock();
        let orders = self.orders_in(clock.today_range()).await?;
        Ok(report::hourly_sales(&clock, &orders))
    }

    /// One bucket per day, oldest first. Defaults to the last 7 days.
    pub async fn daily_sales(&self, days: Option<u32>) -> ServiceResult<Vec<DailyBucket>> {
        let days = window(days, DEFAULT_DAILY_SALES_DAYS);
        debug!(days, "daily_sales");

        let clock = self.ctx.report_clock();
        let orders = self.orders_in(clock.trailing(days)).await?;
        Ok(report::daily_sales(&clock, days, &orders))
    }

    /// Best sellers by quantity. Defaults to 30 days and 10 items.
    pub async fn top_items(&self, days: Option<u32>, limit: Option<usize>) -> ServiceResult<Vec<ItemSales>> {
        let days = window(days, DEFAULT_RANKING_DAYS);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);

        let range = self.ctx.report_clock().trailing(days);
        let orders = self.orders_in(range).await?;
        let catalog = self.ctx.catalog().await?;
        Ok(report::top_items(range, &orders, &catalog, limit))
    }

    pub async fn category_breakdown(
        &self,
        days: Option<u32>,
        limit: Option<usize>,
    ) -> ServiceResult<Vec<CategorySales>> {
        let days = window(days, DEFAULT_RANKING_DAYS);
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);

        let range = self.ctx.report_clock().trailing(days);
        let orders = self.orders_in(range).await?;
        let catalog = self.ctx.catalog().await?;
        Ok(report::category_breakdown(range, &orders, &catalog, limit))
    }

    /// Completed payments per method. Defaults to today.
    pub async fn payment_breakdown(&self, range: Option<DateRange>) -> ServiceResult<PaymentBreakdown> {
        let range = range.unwrap_or_else(|| self.ctx.report_clock().today_range());
        let payments = self
            .ctx
            .store()
            .list_payments(&PaymentFilter::completed_in(range))
            .await?;
        Ok(report::payment_breakdown(range, &payments))
    }

    /// Kitchen queue, oldest first.
    pub async fn active_orders(&self) -> ServiceResult<Vec<Order>> {
        let filter = OrderFilter::all().with_statuses(&[
            OrderStatus::Pending,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ]);
        let orders = self.ctx.store().list_orders(&filter).await?;
        Ok(report::active_orders(orders))
    }

    pub async fn recent_orders(&self, limit: Option<usize>) -> ServiceResult<Vec<Order>> {
        let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_LIMIT);
        let orders = self
            .ctx
            .store()
            .list_orders(&OrderFilter::all().newest_first(limit))
            .await?;
        Ok(report::recent_orders(orders, limit))
    }

    /// The cached aggregate, an empty day when nothing was recorded.
    pub async fn daily_stat(&self, date: NaiveDate) -> ServiceResult<DailyStat> {
        Ok(self
            .ctx
            .store()
            .get_daily_stat(date)
            .await?
            .unwrap_or_else(|| DailyStat::empty(date)))
    }

    /// Cached aggregates for the last `days` local days (default 7), oldest
    /// first, with an empty entry for each day that has no row.
    pub async fn daily_stats(&self, days: Option<u32>) -> ServiceResult<Vec<DailyStat>> {
        let days = window(days, DEFAULT_DAILY_SALES_DAYS);
        let today = self.ctx.report_clock().today;
        let first = today
            .checked_sub_days(Days::new(u64::from(days - 1)))
            .unwrap_or(today);

        let mut recorded = self
            .ctx
            .store()
            .list_daily_stats(first, today)
            .await?
            .into_iter()
            .peekable();

        Ok(first
            .iter_days()
            .take(days as usize)
            .map(|date| match recorded.next_if(|s| s.date == date) {
                Some(stat) => stat,
                None => DailyStat::empty(date),
            })
            .collect())
    }
}

fn window(days: Option<u32>, default: u32) -> u32 {
    days.filter(|d| *d > 0).unwrap_or(default).min(MAX_REPORT_DAYS)
}

// =============================================================================
// Unit Tests
// =============================================================================

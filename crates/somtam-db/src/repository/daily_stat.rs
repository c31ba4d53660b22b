//! # Daily Stat Repository
//!
//! The dashboard's per-day cache. Every write is a single statement so
//! concurrent payments on the same day cannot lose increments.
//!
//! ```text
//! payment completes  ──► bump(date, +delta)      INSERT ... ON CONFLICT DO UPDATE
//! payment refunded   ──► apply(date, -delta)     UPDATE only, 0 rows = no cache row
//! rebuild            ──► put(stat)               overwrite from source of truth
//! ```

use chrono::NaiveDate;
use sqlx::SqlitePool;
use tracing::debug;

use somtam_core::{DailyStat, DailyStatDelta};

use crate::error::DbResult;

#[derive(Debug, Clone)]
pub struct DailyStatRepository {
    pool: SqlitePool,
}

impl DailyStatRepository {
    pub fn new(pool: SqlitePool) -> Self {
        DailyStatRepository { pool }
    }

    /// Adds a delta, creating the row when the day has none yet.
    pub async fn bump(&self, date: NaiveDate, delta: DailyStatDelta) -> DbResult<()> {
        debug!(%date, orders = delta.orders, revenue_cents = delta.revenue_cents, "Bumping daily stat");

        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, total_orders, total_revenue_cents, total_items)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (date) DO UPDATE SET
                total_orders = total_orders + excluded.total_orders,
                total_revenue_cents = total_revenue_cents + excluded.total_revenue_cents,
                total_items = total_items + excluded.total_items
            "#,
        )
        .bind(date)
        .bind(delta.orders)
        .bind(delta.revenue_cents)
        .bind(delta.items)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds a delta to an existing row only. Returns whether a row existed.
    pub async fn apply(&self, date: NaiveDate, delta: DailyStatDelta) -> DbResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE daily_stats SET
                total_orders = total_orders + ?2,
                total_revenue_cents = total_revenue_cents + ?3,
                total_items = total_items + ?4
            WHERE date = ?1
            "#,
        )
        .bind(date)
        .bind(delta.orders)
        .bind(delta.revenue_cents)
        .bind(delta.items)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn get(&self, date: NaiveDate) -> DbResult<Option<DailyStat>> {
        let stat = sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT date, total_orders, total_revenue_cents, total_items
            FROM daily_stats WHERE date = ?1
            "#,
        )
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(stat)
    }

    /// Overwrites a day with freshly computed numbers.
    pub async fn put(&self, stat: &DailyStat) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO daily_stats (date, total_orders, total_revenue_cents, total_items)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (date) DO UPDATE SET
                total_orders = excluded.total_orders,
                total_revenue_cents = excluded.total_revenue_cents,
                total_items = excluded.total_items
            "#,
        )
        .bind(stat.date)
        .bind(stat.total_orders)
        .bind(stat.total_revenue_cents)
        .bind(stat.total_items)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Days in `[from, to]`, oldest first.
    pub async fn list(&self, from: NaiveDate, to: NaiveDate) -> DbResult<Vec<DailyStat>> {
        let stats = sqlx::query_as::<_, DailyStat>(
            r#"
            SELECT date, total_orders, total_revenue_cents, total_items
            FROM daily_stats
            WHERE date >= ?1 AND date <= ?2
            ORDER BY date
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_all(&self.pool)
        .await?;

        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    fn delta(orders: i64, revenue_cents: i64, items: i64) -> DailyStatDelta {
        DailyStatDelta {
            orders,
            revenue_cents,
            items,
        }
    }

    #[tokio::test]
    async fn test_bump_accumulates() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = db.daily_stats();
        let day = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();

        stats.bump(day, delta(1, 4815, 1)).await.unwrap();
        stats.bump(day, delta(1, 6420, 2)).await.unwrap();

        let stat = stats.get(day).await.unwrap().unwrap();
        assert_eq!(stat.total_orders, 2);
        assert_eq!(stat.total_revenue_cents, 11235);
        assert_eq!(stat.total_items, 3);

        assert!(stats.apply(day, delta(-1, -4815, -1)).await.unwrap());
        assert_eq!(stats.get(day).await.unwrap().unwrap().total_orders, 1);
    }

    #[tokio::test]
    async fn test_apply_without_row_reports_miss() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

        assert!(!db.daily_stats().apply(day, delta(-1, -100, -1)).await.unwrap());
        assert!(db.daily_stats().get(day).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_put_overwrites_and_list_orders_by_date() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let stats = db.daily_stats();
        let d1 = NaiveDate::from_ymd_opt(2026, 10, 14).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();

        stats.bump(d2, delta(5, 500, 5)).await.unwrap();
        stats
            .put(&DailyStat {
                date: d2,
                total_orders: 1,
                total_revenue_cents: 100,
                total_items: 1,
            })
            .await
            .unwrap();
        stats.put(&DailyStat::empty(d1)).await.unwrap();

        let listed = stats.list(d1, d2).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].date, d1);
        assert_eq!(listed[1].total_orders, 1);
    }
}

//! # Order Repository
//!
//! Orders, their lines and the per-day order-number sequence.
//!
//! ## Storage Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders ─────┬──< order_lines ─────< order_line_addons                  │
//! │   (header)   │     (position keeps   (frozen add-on name and price)     │
//! │              │      the line order)                                     │
//! │              └──< payments   (payment repository)                       │
//! │                                                                         │
//! │  order_sequences (date, last)   ORD-20261016-0001, -0002, ...           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Writes that touch lines always rewrite header and line set in one
//! transaction, so totals never disagree with the lines on disk.

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::debug;

use somtam_core::{
    LineAddon, Order, OrderFilter, OrderLine, OrderStatus, PaymentMethod, PaymentStatus,
};

use super::{spice_level, ts, ts_opt};
use crate::error::{DbError, DbResult};

const ORDER_COLUMNS: &str = "id, order_number, table_number, customer_name, status, \
     payment_status, payment_method, subtotal_cents, tax_cents, discount_cents, \
     total_cents, notes, created_at, updated_at, completed_at";

#[derive(Debug, FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    table_number: Option<String>,
    customer_name: Option<String>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    payment_method: Option<PaymentMethod>,
    subtotal_cents: i64,
    tax_cents: i64,
    discount_cents: i64,
    total_cents: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            order_number: self.order_number,
            table_number: self.table_number,
            customer_name: self.customer_name,
            lines,
            status: self.status,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
            notes: self.notes,
            created_at: self.created_at,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct LineRow {
    id: String,
    order_id: String,
    menu_item_id: String,
    name_snapshot: String,
    quantity: i64,
    unit_price_cents: i64,
    total_price_cents: i64,
    spice_level: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct LineAddonRow {
    line_id: String,
    addon_id: String,
    name: String,
    price_cents: i64,
}

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts a new order with all its lines in one transaction.
    ///
    /// ## Errors
    /// `UniqueViolation` when the order number is taken.
    pub async fn insert(&self, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            lines = order.lines.len(),
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, table_number, customer_name, status,
                payment_status, payment_method, subtotal_cents, tax_cents,
                discount_cents, total_cents, notes, created_at, updated_at,
                completed_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.table_number)
        .bind(&order.customer_name)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(order.payment_method)
        .bind(order.subtotal_cents)
        .bind(order.tax_cents)
        .bind(order.discount_cents)
        .bind(order.total_cents)
        .bind(&order.notes)
        .bind(ts(&order.created_at))
        .bind(ts(&order.updated_at))
        .bind(ts_opt(&order.completed_at))
        .execute(&mut *tx)
        .await?;

        insert_lines(&mut tx, &order.lines).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Persists header and line set of an existing order atomically.
    pub async fn save(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, lines = order.lines.len(), "Saving order with lines");

        let mut tx = self.pool.begin().await?;

        if write_header(&mut tx, order).await? == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
            .bind(&order.id)
            .execute(&mut *tx)
            .await?;
        insert_lines(&mut tx, &order.lines).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Persists status, payment and totals columns only.
    pub async fn update_header(&self, order: &Order) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        if write_header(&mut conn, order).await? == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(self.attach_lines(row.into_iter().collect()).await?.pop())
    }

    pub async fn get_by_number(&self, order_number: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_number = ?1");
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(self.attach_lines(row.into_iter().collect()).await?.pop())
    }

    /// Lists orders matching a filter, lines included.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

        if !filter.statuses.is_empty() {
            qb.push(" AND status IN (");
            let mut separated = qb.separated(", ");
            for status in &filter.statuses {
                separated.push_bind(*status);
            }
            separated.push_unseparated(")");
        }
        if let Some(payment_status) = filter.payment_status {
            qb.push(" AND payment_status = ").push_bind(payment_status);
        }
        if let Some(range) = filter.created {
            qb.push(" AND created_at >= ").push_bind(ts(&range.start));
            qb.push(" AND created_at < ").push_bind(ts(&range.end));
        }
        qb.push(if filter.newest_first {
            " ORDER BY created_at DESC"
        } else {
            " ORDER BY created_at ASC"
        });
        if let Some(limit) = filter.limit {
            qb.push(" LIMIT ").push_bind(limit as i64);
        }

        let rows = qb.build_query_as::<OrderRow>().fetch_all(&self.pool).await?;
        debug!(count = rows.len(), "Orders listed");

        self.attach_lines(rows).await
    }

    /// Hands out the next order sequence for a calendar date.
    ///
    /// One statement, so concurrent callers never see the same number.
    pub async fn next_sequence(&self, date: NaiveDate) -> DbResult<i64> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_sequences (date, last) VALUES (?1, 1)
            ON CONFLICT (date) DO UPDATE SET last = last + 1
            RETURNING last
            "#,
        )
        .bind(date)
        .fetch_one(&self.pool)
        .await?;

        Ok(seq)
    }

    async fn attach_lines(&self, rows: Vec<OrderRow>) -> DbResult<Vec<Order>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT id, order_id, menu_item_id, name_snapshot, quantity, unit_price_cents, \
             total_price_cents, spice_level, notes, created_at \
             FROM order_lines WHERE order_id IN (",
        );
        let mut separated = qb.separated(", ");
        for row in &rows {
            separated.push_bind(row.id.clone());
        }
        separated.push_unseparated(") ORDER BY order_id, position");
        let line_rows = qb.build_query_as::<LineRow>().fetch_all(&self.pool).await?;

        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT la.line_id, la.addon_id, la.name, la.price_cents \
             FROM order_line_addons la JOIN order_lines l ON l.id = la.line_id \
             WHERE l.order_id IN (",
        );
        let mut separated = qb.separated(", ");
        for row in &rows {
            separated.push_bind(row.id.clone());
        }
        separated.push_unseparated(") ORDER BY la.line_id, la.position");
        let addon_rows = qb.build_query_as::<LineAddonRow>().fetch_all(&self.pool).await?;

        let mut addons: HashMap<String, Vec<LineAddon>> = HashMap::new();
        for a in addon_rows {
            addons.entry(a.line_id).or_default().push(LineAddon {
                addon_id: a.addon_id,
                name: a.name,
                price_cents: a.price_cents,
            });
        }

        let mut lines: HashMap<String, Vec<OrderLine>> = HashMap::new();
        for l in line_rows {
            let line = OrderLine {
                spice_level: spice_level(l.spice_level, "order_lines")?,
                addons: addons.remove(&l.id).unwrap_or_default(),
                id: l.id,
                order_id: l.order_id.clone(),
                menu_item_id: l.menu_item_id,
                name_snapshot: l.name_snapshot,
                quantity: l.quantity,
                unit_price_cents: l.unit_price_cents,
                total_price_cents: l.total_price_cents,
                notes: l.notes,
                created_at: l.created_at,
            };
            lines.entry(l.order_id).or_default().push(line);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let order_lines = lines.remove(&row.id).unwrap_or_default();
                row.into_order(order_lines)
            })
            .collect())
    }
}

/// Writes the mutable header columns. Returns rows affected.
pub(crate) async fn write_header(conn: &mut SqliteConnection, order: &Order) -> DbResult<u64> {
    let result = sqlx::query(
        r#"
        UPDATE orders SET
            table_number = ?1,
            customer_name = ?2,
            status = ?3,
            payment_status = ?4,
            payment_method = ?5,
            subtotal_cents = ?6,
            tax_cents = ?7,
            discount_cents = ?8,
            total_cents = ?9,
            notes = ?10,
            updated_at = ?11,
            completed_at = ?12
        WHERE id = ?13
        "#,
    )
    .bind(&order.table_number)
    .bind(&order.customer_name)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.payment_method)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(&order.notes)
    .bind(ts(&order.updated_at))
    .bind(ts_opt(&order.completed_at))
    .bind(&order.id)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

async fn insert_lines(conn: &mut SqliteConnection, lines: &[OrderLine]) -> DbResult<()> {
    for (position, line) in lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, position, menu_item_id, name_snapshot, quantity,
                unit_price_cents, total_price_cents, spice_level, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(position as i64)
        .bind(&line.menu_item_id)
        .bind(&line.name_snapshot)
        .bind(line.quantity)
        .bind(line.unit_price_cents)
        .bind(line.total_price_cents)
        .bind(i64::from(line.spice_level))
        .bind(&line.notes)
        .bind(ts(&line.created_at))
        .execute(&mut *conn)
        .await?;

        for (addon_pos, addon) in line.addons.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO order_line_addons (line_id, position, addon_id, name, price_cents)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&line.id)
            .bind(addon_pos as i64)
            .bind(&addon.addon_id)
            .bind(&addon.name)
            .bind(addon.price_cents)
            .execute(&mut *conn)
            .await?;
        }
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================

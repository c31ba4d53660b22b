//! # Payment Repository
//!
//! Settlement and refund writes. Each one changes a payment row and the
//! owning order header together, inside one transaction.
//!
//! The partial unique index `idx_payments_one_completed` backs the
//! "at most one completed payment per order" rule: a second settlement
//! fails with [`DbError::UniqueViolation`] even if two writers raced past
//! the in-process checks.

use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::{debug, info};

use somtam_core::{Order, Payment, PaymentFilter};

use super::order::write_header;
use super::{ts, ts_opt};
use crate::error::{DbError, DbResult};

/// Entity name of the not-found error a refund returns when the payment is
/// no longer completed.
pub const COMPLETED_PAYMENT: &str = "Completed payment";

const PAYMENT_COLUMNS: &str = "id, order_id, amount_cents, method, received_cents, change_cents, \
     transaction_id, status, refund_reason, created_at, refunded_at";

#[derive(Debug, Clone)]
pub struct PaymentRepository {
    pool: SqlitePool,
}

impl PaymentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PaymentRepository { pool }
    }

    /// Records a completed payment and the paid order header.
    pub async fn settle(&self, payment: &Payment, order: &Order) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, amount_cents, method, received_cents, change_cents,
                transaction_id, status, refund_reason, created_at, refunded_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.amount_cents)
        .bind(payment.method)
        .bind(payment.received_cents)
        .bind(payment.change_cents)
        .bind(&payment.transaction_id)
        .bind(payment.status)
        .bind(&payment.refund_reason)
        .bind(ts(&payment.created_at))
        .bind(ts_opt(&payment.refunded_at))
        .execute(&mut *tx)
        .await?;

        if write_header(&mut tx, order).await? == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        tx.commit().await?;

        info!(
            payment_id = %payment.id,
            order_id = %order.id,
            amount_cents = payment.amount_cents,
            method = %payment.method,
            "Payment stored"
        );
        Ok(())
    }

    /// Flips a completed payment to refunded along with its order header.
    ///
    /// ## Errors
    /// `NotFound` when no *completed* payment with that id exists.
    pub async fn refund(&self, payment: &Payment, order: &Order) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE payments
            SET status = ?1, refund_reason = ?2, refunded_at = ?3
            WHERE id = ?4 AND status = 'completed'
            "#,
        )
        .bind(payment.status)
        .bind(&payment.refund_reason)
        .bind(ts_opt(&payment.refunded_at))
        .bind(&payment.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(COMPLETED_PAYMENT, &payment.id));
        }
        if write_header(&mut tx, order).await? == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        tx.commit().await?;

        info!(payment_id = %payment.id, order_id = %order.id, "Refund stored");
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Payment>> {
        let sql = format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1");
        let payment = sqlx::query_as::<_, Payment>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Lists payments matching a filter, oldest first.
    pub async fn list(&self, filter: &PaymentFilter) -> DbResult<Vec<Payment>> {
        let mut qb =
            QueryBuilder::<Sqlite>::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE 1 = 1"));

        if let Some(order_id) = &filter.order_id {
            qb.push(" AND order_id = ").push_bind(order_id.clone());
        }
        if let Some(status) = filter.status {
            qb.push(" AND status = ").push_bind(status);
        }
        if let Some(range) = filter.created {
            qb.push(" AND created_at >= ").push_bind(ts(&range.start));
            qb.push(" AND created_at < ").push_bind(ts(&range.end));
        }
        qb.push(" ORDER BY created_at ASC");

        let payments = qb.build_query_as::<Payment>().fetch_all(&self.pool).await?;
        debug!(count = payments.len(), "Payments listed");

        Ok(payments)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! # Order Lifecycle
//!
//! State machine for [`Order`], plus the request used to create one.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐    ┌───────────┐    ┌───────┐    ┌───────────┐            │
//! │   │ pending │───►│ preparing │───►│ ready │───►│ completed │ (terminal) │
//! │   └────┬────┘    └─────┬─────┘    └───┬───┘    └─────┬─────┘            │
//! │        │  add/remove   │              │              │                  │
//! │        │  lines here   │              │              │ refund only      │
//! │        ▼               ▼              ▼              ▼                  │
//! │   ┌──────────────────────────────────────────────────────┐              │
//! │   │                 cancelled (terminal)                 │              │
//! │   └──────────────────────────────────────────────────────┘              │
//! │                                                                         │
//! │   Payment status runs alongside: unpaid ──► paid ──► refunded           │
//! │   A paid order cannot be cancelled, only refunded.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any move between the three non-terminal statuses is allowed, the kitchen
//! screen occasionally needs to step back from `ready` to `preparing`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::pricing::{LineRequest, PricedLine, PricedOrder, Totals};
use crate::types::{Order, OrderLine, OrderStatus, PaymentMethod, PaymentStatus};
use crate::validation::{validate_line_count, validate_optional_text, MAX_NOTES_LEN};
use crate::ORDER_NUMBER_PREFIX;

/// Longest table number or customer name accepted.
pub const MAX_LABEL_LEN: usize = 100;

// =============================================================================
// Create Request
// =============================================================================

/// Everything the terminal sends to place an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub table_number: Option<String>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub lines: Vec<LineRequest>,
}

impl CreateOrderRequest {
    /// Shape checks that do not need the catalog.
    pub fn validate(&self) -> CoreResult<()> {
        validate_line_count(self.lines.len())?;
        validate_optional_text("table_number", self.table_number.as_deref(), MAX_LABEL_LEN)?;
        validate_optional_text("customer_name", self.customer_name.as_deref(), MAX_LABEL_LEN)?;
        validate_optional_text("notes", self.notes.as_deref(), MAX_NOTES_LEN)?;
        Ok(())
    }
}

/// Formats a human-readable order number.
///
/// ```rust
/// use chrono::NaiveDate;
/// use somtam_core::order::format_order_number;
///
/// let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
/// assert_eq!(format_order_number(date, 7), "ORD-20261016-0007");
/// assert_eq!(format_order_number(date, 12345), "ORD-20261016-12345");
/// ```
pub fn format_order_number(date: NaiveDate, sequence: i64) -> String {
    format!(
        "{}-{}-{:04}",
        ORDER_NUMBER_PREFIX,
        date.format("%Y%m%d"),
        sequence
    )
}

// =============================================================================
// Transition Outcomes
// =============================================================================

/// Result of [`Order::set_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Changed { from: OrderStatus, to: OrderStatus },
    Unchanged,
}

/// Result of [`Order::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    Cancelled,
    AlreadyCancelled,
}

// =============================================================================
// Lifecycle
// =============================================================================

impl Order {
    /// Builds a new pending, unpaid order from a priced request.
    pub fn place(
        id: String,
        order_number: String,
        request: &CreateOrderRequest,
        priced: PricedOrder,
        now: DateTime<Utc>,
    ) -> Order {
        let lines = priced
            .lines
            .into_iter()
            .map(|line| line.into_order_line(&id, now))
            .collect();

        let mut order = Order {
            id,
            order_number,
            table_number: request.table_number.clone(),
            customer_name: request.customer_name.clone(),
            lines,
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Unpaid,
            payment_method: None,
            subtotal_cents: 0,
            tax_cents: 0,
            discount_cents: 0,
            total_cents: 0,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        order.apply_totals(priced.totals);
        order
    }

    /// Recomputes subtotal, tax and total from the stored line totals.
    /// The discount is preserved.
    pub fn reprice(&mut self, rate: TaxRate) {
        let totals = Totals::for_lines(&self.lines, self.discount(), rate);
        self.apply_totals(totals);
    }

    fn apply_totals(&mut self, totals: Totals) {
        self.subtotal_cents = totals.subtotal_cents;
        self.tax_cents = totals.tax_cents;
        self.discount_cents = totals.discount_cents;
        self.total_cents = totals.total_cents;
    }

    /// Current totals as a value.
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal_cents: self.subtotal_cents,
            tax_cents: self.tax_cents,
            discount_cents: self.discount_cents,
            total_cents: self.total_cents,
        }
    }

    fn invalid_state(&self) -> CoreError {
        CoreError::InvalidState {
            order_id: self.id.clone(),
            status: self.status.to_string(),
        }
    }

    /// Lines may only change while the kitchen has not started and no
    /// payment has been taken. A completed payment freezes the total.
    pub fn ensure_lines_mutable(&self) -> CoreResult<()> {
        if self.status != OrderStatus::Pending {
            return Err(self.invalid_state());
        }
        if self.payment_status != PaymentStatus::Unpaid {
            return Err(CoreError::AlreadyPaid(self.id.clone()));
        }
        Ok(())
    }

    /// Appends a priced line and re-prices. Returns the new line.
    pub fn add_line(
        &mut self,
        line: PricedLine,
        rate: TaxRate,
        now: DateTime<Utc>,
    ) -> CoreResult<&OrderLine> {
        self.ensure_lines_mutable()?;

        let line = line.into_order_line(&self.id, now);
        self.lines.push(line);
        self.reprice(rate);
        self.updated_at = now;

        let idx = self.lines.len() - 1;
        Ok(&self.lines[idx])
    }

    /// Removes a line by id and re-prices. Returns the removed line.
    pub fn remove_line(
        &mut self,
        line_id: &str,
        rate: TaxRate,
        now: DateTime<Utc>,
    ) -> CoreResult<OrderLine> {
        self.ensure_lines_mutable()?;

        let idx = self
            .lines
            .iter()
            .position(|l| l.id == line_id)
            .ok_or_else(|| CoreError::not_found("OrderLine", line_id))?;
        let removed = self.lines.remove(idx);
        self.reprice(rate);
        self.updated_at = now;

        Ok(removed)
    }

    /// Moves the order to a new status given its wire name.
    ///
    /// ## Rules
    /// - unknown name → `InvalidStatus`
    /// - same status → no-op
    /// - leaving `completed` or `cancelled` → `InvalidState`
    /// - to `cancelled` → same guard as [`Order::cancel`]
    /// - to `completed` → stamps `completed_at`
    pub fn set_status(&mut self, raw: &str, now: DateTime<Utc>) -> CoreResult<StatusChange> {
        let target: OrderStatus = raw.trim().parse()?;
        let from = self.status;

        if target == from {
            return Ok(StatusChange::Unchanged);
        }
        if from.is_terminal() {
            return Err(self.invalid_state());
        }
        if target == OrderStatus::Cancelled {
            self.cancel(now)?;
            return Ok(StatusChange::Changed { from, to: target });
        }

        self.status = target;
        if target == OrderStatus::Completed {
            self.completed_at = Some(now);
        }
        self.updated_at = now;

        Ok(StatusChange::Changed { from, to: target })
    }

    /// Cancels an unpaid order. Payment status is left as is.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> CoreResult<CancelOutcome> {
        if self.payment_status == PaymentStatus::Paid {
            return Err(CoreError::AlreadyPaid(self.id.clone()));
        }
        match self.status {
            OrderStatus::Cancelled => Ok(CancelOutcome::AlreadyCancelled),
            OrderStatus::Completed => Err(self.invalid_state()),
            _ => {
                self.status = OrderStatus::Cancelled;
                self.updated_at = now;
                Ok(CancelOutcome::Cancelled)
            }
        }
    }

    /// Records a successful settlement. Kitchen status is unchanged.
    pub fn mark_paid(&mut self, method: PaymentMethod, now: DateTime<Utc>) {
        self.payment_method = Some(method);
        self.payment_status = PaymentStatus::Paid;
        self.updated_at = now;
    }

    /// Records a refund. A refunded order is always cancelled.
    pub fn mark_refunded(&mut self, now: DateTime<Utc>) {
        self.payment_status = PaymentStatus::Refunded;
        self.status = OrderStatus::Cancelled;
        self.updated_at = now;
    }

    /// Amount still owed, zero once paid or refunded.
    pub fn outstanding(&self) -> Money {
        match self.payment_status {
            PaymentStatus::Unpaid => self.total(),
            _ => Money::zero(),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================


#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::testing::place;
    use super::*;
    use crate::catalog::fixtures::*;
    use crate::pricing::{price_line, AddonPolicy};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 16, 5, 30, 0).unwrap()
    }

    fn som_tam_order() -> Order {
        place(vec![LineRequest::new(SOM_TAM, 1)], now())
    }

    #[test]
    fn test_place_starts_pending_and_unpaid() {
        let order = som_tam_order();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);
        assert_eq!(order.total_cents, 4815);
        assert_eq!(order.lines[0].order_id, order.id);
        assert_eq!(order.lines[0].name_snapshot, "Som Tam Thai");
    }

    #[test]
    fn test_create_request_requires_lines() {
        let err = CreateOrderRequest::default().validate().unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_add_then_remove_restores_totals() {
        let mut order = som_tam_order();
        let before = order.totals();

        let line = price_line(
            &LineRequest::new(LARB, 2).with_addons([SALTED_EGG]),
            &catalog(),
            AddonPolicy::Ignore,
        )
        .unwrap();
        let added_id = order
            .add_line(line, TaxRate::default(), now())
            .unwrap()
            .id
            .clone();
        assert_eq!(order.subtotal_cents, 4500 + 14000);

        order.remove_line(&added_id, TaxRate::default(), now()).unwrap();
        assert_eq!(order.totals(), before);
    }

    #[test]
    fn test_lines_frozen_once_preparing() {
        let mut order = som_tam_order();
        order.set_status("preparing", now()).unwrap();

        let line = price_line(&LineRequest::new(LARB, 1), &catalog(), AddonPolicy::Ignore).unwrap();
        let err = order.add_line(line, TaxRate::default(), now()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidState { ref status, .. } if status == "preparing"));

        let line_id = order.lines[0].id.clone();
        assert!(order.remove_line(&line_id, TaxRate::default(), now()).is_err());
    }

    #[test]
    fn test_remove_unknown_line() {
        let mut order = som_tam_order();
        let err = order.remove_line("missing", TaxRate::default(), now()).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }

    #[test]
    fn test_set_status_walk() {
        let mut order = som_tam_order();

        assert_eq!(
            order.set_status("preparing", now()).unwrap(),
            StatusChange::Changed {
                from: OrderStatus::Pending,
                to: OrderStatus::Preparing
            }
        );
        order.set_status("ready", now()).unwrap();
        // Kitchen stepped back
        order.set_status("preparing", now()).unwrap();
        order.set_status("ready", now()).unwrap();
        assert!(order.completed_at.is_none());

        order.set_status("completed", now()).unwrap();
        assert_eq!(order.completed_at, Some(now()));

        assert_eq!(
            order.set_status("completed", now()).unwrap(),
            StatusChange::Unchanged
        );
        assert!(matches!(
            order.set_status("pending", now()),
            Err(CoreError::InvalidState { .. })
        ));
        assert!(matches!(
            order.set_status("cancelled", now()),
            Err(CoreError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_set_status_unknown() {
        let mut order = som_tam_order();
        assert_eq!(
            order.set_status("served", now()),
            Err(CoreError::InvalidStatus("served".to_string()))
        );
    }

    #[test]
    fn test_cancel_unpaid_keeps_payment_status() {
        let mut order = som_tam_order();
        assert_eq!(order.cancel(now()).unwrap(), CancelOutcome::Cancelled);
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.payment_status, PaymentStatus::Unpaid);

        assert_eq!(order.cancel(now()).unwrap(), CancelOutcome::AlreadyCancelled);
    }

    #[test]
    fn test_lines_frozen_once_paid() {
        let mut order = som_tam_order();
        order.mark_paid(PaymentMethod::Promptpay, now());
        let before = order.totals();

        let line = price_line(&LineRequest::new(LARB, 3), &catalog(), AddonPolicy::Ignore).unwrap();
        let err = order.add_line(line, TaxRate::default(), now()).unwrap_err();
        assert_eq!(err, CoreError::AlreadyPaid(order.id.clone()));

        let line_id = order.lines[0].id.clone();
        assert!(matches!(
            order.remove_line(&line_id, TaxRate::default(), now()),
            Err(CoreError::AlreadyPaid(_))
        ));
        assert_eq!(order.totals(), before);
        assert_eq!(order.lines.len(), 1);
    }

    #[test]
    fn test_cancel_paid_is_rejected() {
        let mut order = som_tam_order();
        order.mark_paid(PaymentMethod::Cash, now());

        assert_eq!(
            order.cancel(now()),
            Err(CoreError::AlreadyPaid(order.id.clone()))
        );
        assert!(matches!(
            order.set_status("cancelled", now()),
            Err(CoreError::AlreadyPaid(_))
        ));
        assert_eq!(order.status, OrderStatus::Pending);
    }

    #[test]
    fn test_cancel_completed_is_invalid() {
        let mut order = som_tam_order();
        order.set_status("completed", now()).unwrap();
        assert!(matches!(order.cancel(now()), Err(CoreError::InvalidState { .. })));
    }

    #[test]
    fn test_refunded_order_cancel_is_noop() {
        let mut order = som_tam_order();
        order.mark_paid(PaymentMethod::Promptpay, now());
        order.mark_refunded(now());

        assert_eq!(order.status, OrderStatus::Cancelled);
        assert_eq!(order.cancel(now()).unwrap(), CancelOutcome::AlreadyCancelled);
        assert_eq!(order.payment_status, PaymentStatus::Refunded);
        assert!(order.outstanding().is_zero());
    }

    #[test]
    fn test_reprice_keeps_discount() {
        let mut order = som_tam_order();
        order.discount_cents = 500;
        order.reprice(TaxRate::default());
        assert_eq!(order.total_cents, 4500 - 500 + 315);
    }
}

//! Query filters shared by every persistence adapter.
//!
//! The SQLite repositories translate these into `WHERE` clauses; the
//! in-memory store evaluates [`OrderFilter::matches`] directly. Both must
//! agree, so the predicate lives here next to the types it reads.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::report::DateRange;
use crate::types::{Order, OrderStatus, Payment, PaymentState, PaymentStatus};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    /// Empty means any status.
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
    #[serde(default)]
    pub payment_status: Option<PaymentStatus>,
    /// On `created_at`.
    #[serde(default)]
    pub created: Option<DateRange>,
    #[serde(default)]
    pub limit: Option<usize>,
    /// Newest first when set, oldest first otherwise.
    #[serde(default)]
    pub newest_first: bool,
}

impl OrderFilter {
    pub fn all() -> Self {
        OrderFilter::default()
    }

    pub fn created_in(range: DateRange) -> Self {
        OrderFilter {
            created: Some(range),
            ..OrderFilter::default()
        }
    }

    pub fn with_statuses(mut self, statuses: &[OrderStatus]) -> Self {
        self.statuses = statuses.to_vec();
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }

    pub fn newest_first(mut self, limit: usize) -> Self {
        self.newest_first = true;
        self.limit = Some(limit);
        self
    }

    pub fn matches(&self, order: &Order) -> bool {
        (self.statuses.is_empty() || self.statuses.contains(&order.status))
            && self
                .payment_status
                .map_or(true, |s| s == order.payment_status)
            && self.created.map_or(true, |r| r.contains(order.created_at))
    }

    /// Sorts and truncates an already matched set.
    pub fn arrange(&self, orders: &mut Vec<Order>) {
        if self.newest_first {
            orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        } else {
            orders.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        }
        if let Some(limit) = self.limit {
            orders.truncate(limit);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentFilter {
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub status: Option<PaymentState>,
    #[serde(default)]
    pub created: Option<DateRange>,
}

impl PaymentFilter {
    pub fn for_order(order_id: impl Into<String>) -> Self {
        PaymentFilter {
            order_id: Some(order_id.into()),
            ..PaymentFilter::default()
        }
    }

    pub fn completed_in(range: DateRange) -> Self {
        PaymentFilter {
            status: Some(PaymentState::Completed),
            created: Some(range),
            ..PaymentFilter::default()
        }
    }

    pub fn matches(&self, payment: &Payment) -> bool {
        self.order_id
            .as_deref()
            .map_or(true, |id| id == payment.order_id)
            && self.status.map_or(true, |s| s == payment.status)
            && self.created.map_or(true, |r| r.contains(payment.created_at))
    }
}

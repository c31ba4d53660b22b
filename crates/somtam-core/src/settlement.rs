//! # Settlement
//!
//! Payment and refund rules.
//!
//! ## Payment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  settle(order, request)                                                 │
//! │     │                                                                   │
//! │     ├── paid?            ──► AlreadyPaid                                │
//! │     ├── cancelled?       ──► OrderCancelled                             │
//! │     ├── no lines?        ──► Validation                                 │
//! │     ├── tendered < 0?    ──► Validation                                 │
//! │     ├── cash < total?    ──► InsufficientPayment                        │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  Payment { amount = order.total, status = completed, change }           │
//! │  Order   { payment_status = paid, payment_method }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! PromptPay and credit card are recorded as immediately successful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{Order, OrderStatus, Payment, PaymentMethod, PaymentState, PaymentStatus};
use crate::validation::{validate_optional_text, validate_tendered_cents, MAX_NOTES_LEN};

/// A request to settle an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentRequest {
    pub method: PaymentMethod,
    /// Cash handed over. Ignored for other methods.
    #[serde(default)]
    pub received_cents: Option<i64>,
    #[serde(default)]
    pub transaction_id: Option<String>,
}

impl PaymentRequest {
    pub fn cash(received_cents: i64) -> Self {
        PaymentRequest {
            method: PaymentMethod::Cash,
            received_cents: Some(received_cents),
            transaction_id: None,
        }
    }

    pub fn electronic(method: PaymentMethod, transaction_id: Option<String>) -> Self {
        PaymentRequest {
            method,
            received_cents: None,
            transaction_id,
        }
    }
}

/// Works out `(received, change)` for a total.
///
/// Cash with no tendered amount counts as exact tender.
pub fn tender(method: PaymentMethod, total: Money, received: Option<i64>) -> CoreResult<(Money, Money)> {
    if method != PaymentMethod::Cash {
        return Ok((total, Money::zero()));
    }

    let received = match received {
        Some(cents) => {
            validate_tendered_cents(cents)?;
            Money::from_cents(cents)
        }
        None => total,
    };
    if received < total {
        return Err(CoreError::InsufficientPayment {
            required: total,
            received,
        });
    }

    Ok((received, received - total))
}

/// Settles an order, mutating it to paid and returning the payment record.
///
/// On error the order is untouched.
pub fn settle(
    order: &mut Order,
    request: &PaymentRequest,
    payment_id: String,
    now: DateTime<Utc>,
) -> CoreResult<Payment> {
    if order.payment_status == PaymentStatus::Paid {
        return Err(CoreError::AlreadyPaid(order.id.clone()));
    }
    if order.status == OrderStatus::Cancelled {
        return Err(CoreError::OrderCancelled(order.id.clone()));
    }
    if order.lines.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    validate_optional_text("transaction_id", request.transaction_id.as_deref(), MAX_NOTES_LEN)?;

    let total = order.total();
    let (received, change) = tender(request.method, total, request.received_cents)?;

    let payment = Payment {
        id: payment_id,
        order_id: order.id.clone(),
        amount_cents: total.cents(),
        method: request.method,
        received_cents: Some(received.cents()),
        change_cents: change.cents(),
        transaction_id: request.transaction_id.clone(),
        status: PaymentState::Completed,
        refund_reason: None,
        created_at: now,
        refunded_at: None,
    };
    order.mark_paid(request.method, now);

    Ok(payment)
}

/// Refunds a completed payment and cancels its order.
pub fn refund(
    payment: &mut Payment,
    order: &mut Order,
    reason: Option<String>,
    now: DateTime<Utc>,
) -> CoreResult<()> {
    if payment.status != PaymentState::Completed {
        return Err(CoreError::AlreadyRefunded(payment.id.clone()));
    }
    validate_optional_text("reason", reason.as_deref(), MAX_NOTES_LEN)?;

    payment.status = PaymentState::Refunded;
    payment.refund_reason = reason;
    payment.refunded_at = Some(now);
    order.mark_refunded(now);

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Order Service
//!
//! Order lifecycle and settlement over the [`Store`](crate::Store) port.
//!
//! ## Mutation Pattern
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌───────────────┐   ┌─────────────┐
//! │ lock(id) │──►│ load      │──►│ somtam-core   │──►│ persist     │
//! │          │   │ order     │   │ rule (pure)   │   │ (one tx)    │
//! └──────────┘   └───────────┘   └───────────────┘   └─────────────┘
//! ```
//!
//! A failed rule leaves nothing written. The one completed payment per
//! order rule is also enforced by the store, so a second process writing
//! to the same database still gets `AlreadyPaid`.

use chrono::NaiveDate;
use tracing::{debug, info, warn};
use uuid::Uuid;

use somtam_core::order::{format_order_number, CancelOutcome, StatusChange};
use somtam_core::pricing::{price_line, price_order};
use somtam_core::receipt::Receipt;
use somtam_core::report::daily_stat_for;
use somtam_core::settlement::{refund, settle};
use somtam_core::validation::validate_line_count;
use somtam_core::{
    CoreError, CreateOrderRequest, DailyStat, DailyStatDelta, LineRequest, Order, OrderFilter,
    Payment, PaymentFilter, PaymentRequest, PricedOrder,
};

use super::ServiceContext;
use crate::error::{ServiceError, ServiceResult, StoreError};
use somtam_db::repository::payment::COMPLETED_PAYMENT;
use crate::locks::OrderLocks;

#[derive(Clone)]
pub struct OrderService {
    ctx: ServiceContext,
    locks: OrderLocks,
}

impl OrderService {
    pub fn new(ctx: ServiceContext) -> Self {
        OrderService {
            ctx,
            locks: OrderLocks::new(),
        }
    }

    async fn load(&self, order_id: &str) -> ServiceResult<Order> {
        self.ctx
            .store()
            .get_order(order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id).into())
    }

    async fn load_payment(&self, payment_id: &str) -> ServiceResult<Payment> {
        self.ctx
            .store()
            .get_payment(payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id).into())
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    /// Prices lines without creating anything.
    pub async fn price_order(&self, lines: &[LineRequest]) -> ServiceResult<PricedOrder> {
        let settings = self.ctx.shop_settings().await?;
        let catalog = self.ctx.catalog().await?;
        Ok(price_order(
            lines,
            &catalog,
            settings.tax_rate,
            settings.unknown_addon_policy,
        )?)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    pub async fn create_order(&self, request: CreateOrderRequest) -> ServiceResult<Order> {
        debug!(lines = request.lines.len(), "create_order");
        request.validate()?;

        let priced = self.price_order(&request.lines).await?;

        let now = self.ctx.now();
        let date = self.ctx.local_date(now);
        let sequence = self.ctx.store().next_order_sequence(date).await?;
        let order = Order::place(
            Uuid::new_v4().to_string(),
            format_order_number(date, sequence),
            &request,
            priced,
            now,
        );

        self.ctx.store().insert_order(&order).await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            total = %order.total(),
            lines = order.lines.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Appends a line to a pending order.
    pub async fn add_line(&self, order_id: &str, line: LineRequest) -> ServiceResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;
        order.ensure_lines_mutable()?;

        let settings = self.ctx.shop_settings().await?;
        let catalog = self.ctx.catalog().await?;
        let priced = price_line(&line, &catalog, settings.unknown_addon_policy)?;
        validate_line_count(order.lines.len() + 1)?;

        let line_id = order.add_line(priced, settings.tax_rate, self.ctx.now())?.id.clone();
        self.ctx.store().save_order(&order).await?;

        info!(order_id = %order.id, line_id = %line_id, total = %order.total(), "Line added");
        Ok(order)
    }

    pub async fn remove_line(&self, order_id: &str, line_id: &str) -> ServiceResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        let settings = self.ctx.shop_settings().await?;
        order.remove_line(line_id, settings.tax_rate, self.ctx.now())?;
        self.ctx.store().save_order(&order).await?;

        info!(order_id = %order.id, line_id = %line_id, total = %order.total(), "Line removed");
        Ok(order)
    }

    /// Moves the order to the status named by `status`.
    pub async fn set_status(&self, order_id: &str, status: &str) -> ServiceResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        match order.set_status(status, self.ctx.now())? {
            StatusChange::Changed { from, to } => {
                self.ctx.store().save_order_header(&order).await?;
                info!(order_id = %order.id, %from, %to, "Order status changed");
            }
            StatusChange::Unchanged => {
                debug!(order_id = %order.id, status = %order.status, "Status unchanged");
            }
        }
        Ok(order)
    }

    pub async fn cancel_order(&self, order_id: &str) -> ServiceResult<Order> {
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        match order.cancel(self.ctx.now())? {
            CancelOutcome::Cancelled => {
                self.ctx.store().save_order_header(&order).await?;
                info!(order_id = %order.id, "Order cancelled");
            }
            CancelOutcome::AlreadyCancelled => {
                debug!(order_id = %order.id, "Order already cancelled");
            }
        }
        Ok(order)
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Settles an order in full. Returns the payment and the paid order.
    pub async fn process_payment(
        &self,
        order_id: &str,
        request: PaymentRequest,
    ) -> ServiceResult<(Payment, Order)> {
        debug!(order_id = %order_id, method = %request.method, "process_payment");
        let _guard = self.locks.acquire(order_id).await;
        let mut order = self.load(order_id).await?;

        let payment = settle(&mut order, &request, Uuid::new_v4().to_string(), self.ctx.now())?;

        match self.ctx.store().settle_payment(&payment, &order).await {
            Ok(()) => {}
            Err(StoreError::Conflict(_)) => {
                return Err(CoreError::AlreadyPaid(order.id.clone()).into());
            }
            Err(e) => return Err(e.into()),
        }

        let date = self.ctx.local_date(payment.created_at);
        self.ctx
            .store()
            .bump_daily_stat(date, DailyStatDelta::payment(&payment, &order))
            .await?;

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            method = %payment.method,
            amount = %payment.amount(),
            change = %payment.change(),
            "Payment completed"
        );
        Ok((payment, order))
    }

    /// Refunds a completed payment and cancels its order.
    pub async fn refund_payment(
        &self,
        payment_id: &str,
        reason: Option<String>,
    ) -> ServiceResult<(Payment, Order)> {
        debug!(payment_id = %payment_id, "refund_payment");
        let order_id = self.load_payment(payment_id).await?.order_id;

        let _guard = self.locks.acquire(&order_id).await;
        let mut payment = self.load_payment(payment_id).await?;
        let mut order = self.load(&order_id).await?;

        refund(&mut payment, &mut order, reason, self.ctx.now())?;

        self.ctx
            .store()
            .refund_payment(&payment, &order)
            .await
            .map_err(|e| refund_error(&payment.id, e))?;

        let date = self.ctx.local_date(payment.created_at);
        match self
            .ctx
            .store()
            .apply_daily_stat(date, DailyStatDelta::refund(&payment, &order))
            .await
        {
            Ok(true) => {}
            Ok(false) => warn!(%date, payment_id = %payment.id, "No daily stat to decrement"),
            Err(e) => warn!(%date, payment_id = %payment.id, error = %e, "Daily stat decrement failed"),
        }

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            amount = %payment.amount(),
            "Payment refunded"
        );
        Ok((payment, order))
    }

    /// Recomputes the cached aggregate of one local day and stores it.
    pub async fn rebuild_daily_stat(&self, date: NaiveDate) -> ServiceResult<DailyStat> {
        let clock = self.ctx.report_clock();
        let payments = self
            .ctx
            .store()
            .list_payments(&PaymentFilter::completed_in(clock.day(date)))
            .await?;

        let mut orders = Vec::with_capacity(payments.len());
        for payment in &payments {
            if let Some(order) = self.ctx.store().get_order(&payment.order_id).await? {
                orders.push(order);
            }
        }

        let stat = daily_stat_for(&clock, date, &payments, &orders);
        self.ctx.store().put_daily_stat(&stat).await?;

        info!(
            %date,
            orders = stat.total_orders,
            revenue = %stat.revenue(),
            "Daily stat rebuilt"
        );
        Ok(stat)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub async fn get_order(&self, order_id: &str) -> ServiceResult<Order> {
        self.load(order_id).await
    }

    pub async fn list_orders(&self, filter: &OrderFilter) -> ServiceResult<Vec<Order>> {
        Ok(self.ctx.store().list_orders(filter).await?)
    }

    pub async fn get_payment(&self, payment_id: &str) -> ServiceResult<Payment> {
        self.load_payment(payment_id).await
    }

    pub async fn payments_for_order(&self, order_id: &str) -> ServiceResult<Vec<Payment>> {
        Ok(self
            .ctx
            .store()
            .list_payments(&PaymentFilter::for_order(order_id))
            .await?)
    }

    /// Printable receipt for a payment, using the current shop settings.
    pub async fn receipt(&self, payment_id: &str) -> ServiceResult<Receipt> {
        let payment = self.load_payment(payment_id).await?;
        let order = self.load(&payment.order_id).await?;
        let settings = self.ctx.shop_settings().await?;
        Ok(Receipt::build(&order, &payment, &settings)?)
    }
}

/// A refund write that finds no completed payment lost a race with another
/// refund. Any other missing row is reported as it is.
fn refund_error(payment_id: &str, err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound { entity, .. } if entity == COMPLETED_PAYMENT => {
            CoreError::AlreadyRefunded(payment_id.to_string()).into()
        }
        other => other.into(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};

    use super::*;
    use crate::clock::Clock;
    use crate::services::testing::*;
    use somtam_core::{OrderStatus, PaymentMethod, PaymentState, PaymentStatus, ValidationError};

    fn request(lines: Vec<LineRequest>) -> CreateOrderRequest {
        CreateOrderRequest {
            lines,
            ..CreateOrderRequest::default()
        }
    }

    fn core_err(err: ServiceError) -> CoreError {
        match err {
            ServiceError::Core(e) => e,
            other => panic!("expected a core error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_order_prices_and_numbers() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);

            let first = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            assert_eq!(first.subtotal_cents, 4500, "{name}");
            assert_eq!(first.tax_cents, 315, "{name}");
            assert_eq!(first.total_cents, 4815, "{name}");
            assert_eq!(first.status, OrderStatus::Pending, "{name}");
            assert_eq!(first.payment_status, PaymentStatus::Unpaid, "{name}");
            assert_eq!(first.order_number, "ORD-20261016-0001", "{name}");

            let second = orders
                .create_order(request(vec![LineRequest::new(LARB, 2)]))
                .await
                .unwrap();
            assert_eq!(second.order_number, "ORD-20261016-0002", "{name}");

            let stored = orders.get_order(&first.id).await.unwrap();
            assert_eq!(stored, first, "{name}");
        }
    }

    #[tokio::test]
    async fn test_order_number_uses_shop_local_date() {
        for (name, ctx, clock) in contexts().await {
            let orders = OrderService::new(ctx);
            // 23:30 UTC on the 16th is already the 17th in Bangkok
            clock.set(Utc.with_ymd_and_hms(2026, 10, 16, 23, 30, 0).unwrap());

            let order = orders
                .create_order(request(vec![LineRequest::new(STICKY_RICE, 1)]))
                .await
                .unwrap();
            assert_eq!(order.order_number, "ORD-20261017-0001", "{name}");
        }
    }

    #[tokio::test]
    async fn test_create_order_rejects_bad_input() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());

            let err = core_err(orders.create_order(request(vec![])).await.unwrap_err());
            assert!(
                matches!(err, CoreError::Validation(ValidationError::Required { .. })),
                "{name}"
            );

            let err = core_err(
                orders
                    .create_order(request(vec![LineRequest::new("nope", 1)]))
                    .await
                    .unwrap_err(),
            );
            assert_eq!(err, CoreError::UnknownMenuItem("nope".into()), "{name}");

            assert!(orders.list_orders(&OrderFilter::all()).await.unwrap().is_empty(), "{name}");
        }
    }

    #[tokio::test]
    async fn test_add_then_remove_restores_totals() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            let before = order.totals();

            let grown = orders
                .add_line(&order.id, LineRequest::new(LARB, 2).with_spice_level(3))
                .await
                .unwrap();
            assert_eq!(grown.lines.len(), 2, "{name}");
            assert_eq!(grown.subtotal_cents, 4500 + 16000, "{name}");

            let added = grown.lines[1].id.clone();
            let shrunk = orders.remove_line(&order.id, &added).await.unwrap();
            assert_eq!(shrunk.totals(), before, "{name}");

            let stored = orders.get_order(&order.id).await.unwrap();
            assert_eq!(stored.lines.len(), 1, "{name}");
            assert_eq!(stored.totals(), before, "{name}");
        }
    }

    #[tokio::test]
    async fn test_lines_frozen_once_preparing() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();

            orders.set_status(&order.id, "preparing").await.unwrap();

            let err = core_err(
                orders
                    .add_line(&order.id, LineRequest::new(LARB, 1))
                    .await
                    .unwrap_err(),
            );
            assert!(matches!(err, CoreError::InvalidState { .. }), "{name}");

            let line_id = order.lines[0].id.clone();
            let err = core_err(orders.remove_line(&order.id, &line_id).await.unwrap_err());
            assert!(matches!(err, CoreError::InvalidState { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_lines_frozen_once_paid() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            let (payment, _) = orders
                .process_payment(&order.id, PaymentRequest::electronic(PaymentMethod::Promptpay, None))
                .await
                .unwrap();

            let err = core_err(
                orders
                    .add_line(&order.id, LineRequest::new(LARB, 3))
                    .await
                    .unwrap_err(),
            );
            assert_eq!(err, CoreError::AlreadyPaid(order.id.clone()), "{name}");

            let line_id = order.lines[0].id.clone();
            let err = core_err(orders.remove_line(&order.id, &line_id).await.unwrap_err());
            assert_eq!(err, CoreError::AlreadyPaid(order.id.clone()), "{name}");

            let stored = orders.get_order(&order.id).await.unwrap();
            assert_eq!(stored.status, OrderStatus::Pending, "{name}");
            assert_eq!(stored.lines.len(), 1, "{name}");
            assert_eq!(stored.total_cents, payment.amount_cents, "{name}");
        }
    }

    #[tokio::test]
    async fn test_remove_unknown_line() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();

            let err = core_err(orders.remove_line(&order.id, "missing").await.unwrap_err());
            assert!(matches!(err, CoreError::NotFound { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_status_transitions() {
        for (name, ctx, clock) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(LARB, 1)]))
                .await
                .unwrap();

            let err = core_err(orders.set_status(&order.id, "eaten").await.unwrap_err());
            assert_eq!(err, CoreError::InvalidStatus("eaten".into()), "{name}");

            orders.set_status(&order.id, "ready").await.unwrap();
            clock.advance(Duration::minutes(10));
            let done = orders.set_status(&order.id, "completed").await.unwrap();
            assert_eq!(done.completed_at, Some(clock.now()), "{name}");

            // same status is a no-op, leaving a terminal one is not
            orders.set_status(&order.id, "completed").await.unwrap();
            let err = core_err(orders.set_status(&order.id, "pending").await.unwrap_err());
            assert!(matches!(err, CoreError::InvalidState { .. }), "{name}");

            let stored = orders.get_order(&order.id).await.unwrap();
            assert_eq!(stored.status, OrderStatus::Completed, "{name}");
            assert_eq!(stored.completed_at, done.completed_at, "{name}");
        }
    }

    #[tokio::test]
    async fn test_cash_change_and_insufficient_payment() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            // Tax-free shop so the total is a round 80.00
            ctx.store()
                .put_settings(&[("tax_rate".into(), "0".into())], noon())
                .await
                .unwrap();

            let order = orders
                .create_order(request(vec![LineRequest::new(LARB, 1)]))
                .await
                .unwrap();
            assert_eq!(order.total_cents, 8000, "{name}");

            let err = core_err(
                orders
                    .process_payment(&order.id, PaymentRequest::cash(7000))
                    .await
                    .unwrap_err(),
            );
            assert!(matches!(err, CoreError::InsufficientPayment { .. }), "{name}");
            let untouched = orders.get_order(&order.id).await.unwrap();
            assert_eq!(untouched.payment_status, PaymentStatus::Unpaid, "{name}");

            let (payment, paid) = orders
                .process_payment(&order.id, PaymentRequest::cash(10000))
                .await
                .unwrap();
            assert_eq!(payment.change_cents, 2000, "{name}");
            assert_eq!(payment.amount_cents, 8000, "{name}");
            assert_eq!(payment.status, PaymentState::Completed, "{name}");
            assert_eq!(paid.payment_status, PaymentStatus::Paid, "{name}");
            assert_eq!(paid.payment_method, Some(PaymentMethod::Cash), "{name}");
            assert_eq!(paid.status, OrderStatus::Pending, "{name}");
        }
    }

    #[tokio::test]
    async fn test_second_payment_is_already_paid() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();

            orders
                .process_payment(&order.id, PaymentRequest::electronic(PaymentMethod::Promptpay, None))
                .await
                .unwrap();
            let err = core_err(
                orders
                    .process_payment(&order.id, PaymentRequest::cash(10000))
                    .await
                    .unwrap_err(),
            );
            assert_eq!(err, CoreError::AlreadyPaid(order.id.clone()), "{name}");
            assert_eq!(orders.payments_for_order(&order.id).await.unwrap().len(), 1, "{name}");
        }
    }

    #[tokio::test]
    async fn test_payment_on_cancelled_order() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            orders.cancel_order(&order.id).await.unwrap();

            let err = core_err(
                orders
                    .process_payment(&order.id, PaymentRequest::cash(10000))
                    .await
                    .unwrap_err(),
            );
            assert_eq!(err, CoreError::OrderCancelled(order.id.clone()), "{name}");
        }
    }

    #[tokio::test]
    async fn test_concurrent_payments_settle_once() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 2)]))
                .await
                .unwrap();

            let a = {
                let orders = orders.clone();
                let id = order.id.clone();
                tokio::spawn(async move { orders.process_payment(&id, PaymentRequest::cash(20000)).await })
            };
            let b = {
                let orders = orders.clone();
                let id = order.id.clone();
                tokio::spawn(async move {
                    orders
                        .process_payment(&id, PaymentRequest::electronic(PaymentMethod::CreditCard, None))
                        .await
                })
            };

            let results = [a.await.unwrap(), b.await.unwrap()];
            let ok = results.iter().filter(|r| r.is_ok()).count();
            let already_paid = results
                .iter()
                .filter(|r| matches!(r, Err(ServiceError::Core(CoreError::AlreadyPaid(_)))))
                .count();
            assert_eq!((ok, already_paid), (1, 1), "{name}");
        }
    }

    #[tokio::test]
    async fn test_stale_payment_from_second_service_conflicts() {
        // Two services share a store but not their locks, as two processes would
        for (name, ctx, _) in contexts().await {
            let a = OrderService::new(ctx.clone());
            let b = OrderService::new(ctx.clone());
            let order = a
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();

            let mut stale = order.clone();
            let payment = settle(&mut stale, &PaymentRequest::cash(5000), "p-stale".into(), noon()).unwrap();

            b.process_payment(&order.id, PaymentRequest::cash(5000)).await.unwrap();

            let err = ctx.store().settle_payment(&payment, &stale).await.unwrap_err();
            assert!(matches!(err, StoreError::Conflict(_)), "{name}");
        }
    }

    #[tokio::test]
    async fn test_refund_cancels_and_cancel_is_noop() {
        for (name, ctx, clock) in contexts().await {
            let orders = OrderService::new(ctx);
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            let (payment, _) = orders
                .process_payment(&order.id, PaymentRequest::cash(5000))
                .await
                .unwrap();

            clock.advance(Duration::minutes(5));
            let (refunded, order) = orders
                .refund_payment(&payment.id, Some("Wrong table".into()))
                .await
                .unwrap();
            assert_eq!(refunded.status, PaymentState::Refunded, "{name}");
            assert_eq!(refunded.refund_reason.as_deref(), Some("Wrong table"), "{name}");
            assert_eq!(refunded.refunded_at, Some(clock.now()), "{name}");
            assert_eq!(order.status, OrderStatus::Cancelled, "{name}");
            assert_eq!(order.payment_status, PaymentStatus::Refunded, "{name}");

            let again = orders.cancel_order(&order.id).await.unwrap();
            assert_eq!(again.status, OrderStatus::Cancelled, "{name}");
            assert_eq!(again.payment_status, PaymentStatus::Refunded, "{name}");

            let err = core_err(orders.refund_payment(&payment.id, None).await.unwrap_err());
            assert_eq!(err, CoreError::AlreadyRefunded(payment.id.clone()), "{name}");

            let stored = orders.get_payment(&payment.id).await.unwrap();
            assert_eq!(stored.status, PaymentState::Refunded, "{name}");
        }
    }

    #[tokio::test]
    async fn test_refund_store_misses_keep_their_meaning() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            let (payment, paid) = orders
                .process_payment(&order.id, PaymentRequest::cash(5000))
                .await
                .unwrap();

            // the order row is gone: a plain NotFound, not AlreadyRefunded
            let mut stale_payment = payment.clone();
            let mut ghost = Order {
                id: "ghost".into(),
                ..paid.clone()
            };
            refund(&mut stale_payment, &mut ghost, None, noon()).unwrap();
            let err = ctx
                .store()
                .refund_payment(&stale_payment, &ghost)
                .await
                .unwrap_err();
            let err = refund_error(&payment.id, err);
            assert!(
                matches!(err, ServiceError::Store(StoreError::NotFound { ref entity, .. }) if entity == "Order"),
                "{name}: {err:?}"
            );

            // the payment was refunded by someone else first
            let mut late_payment = payment.clone();
            let mut late_order = paid.clone();
            refund(&mut late_payment, &mut late_order, None, noon()).unwrap();
            orders.refund_payment(&payment.id, None).await.unwrap();
            let err = ctx
                .store()
                .refund_payment(&late_payment, &late_order)
                .await
                .unwrap_err();
            let err = core_err(refund_error(&payment.id, err));
            assert_eq!(err, CoreError::AlreadyRefunded(payment.id.clone()), "{name}");
        }
    }

    #[tokio::test]
    async fn test_refund_unknown_payment() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);
            let err = core_err(orders.refund_payment("missing", None).await.unwrap_err());
            assert!(matches!(err, CoreError::NotFound { .. }), "{name}");
        }
    }

    #[tokio::test]
    async fn test_cancel_rules() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx);

            let unpaid = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();
            let cancelled = orders.cancel_order(&unpaid.id).await.unwrap();
            assert_eq!(cancelled.status, OrderStatus::Cancelled, "{name}");
            assert_eq!(cancelled.payment_status, PaymentStatus::Unpaid, "{name}");

            let paid = orders
                .create_order(request(vec![LineRequest::new(LARB, 1)]))
                .await
                .unwrap();
            orders
                .process_payment(&paid.id, PaymentRequest::cash(10000))
                .await
                .unwrap();
            let err = core_err(orders.cancel_order(&paid.id).await.unwrap_err());
            assert_eq!(err, CoreError::AlreadyPaid(paid.id.clone()), "{name}");

            let err = core_err(orders.set_status(&paid.id, "cancelled").await.unwrap_err());
            assert_eq!(err, CoreError::AlreadyPaid(paid.id.clone()), "{name}");
        }
    }

    #[tokio::test]
    async fn test_daily_stat_follows_payments_and_refunds() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            let today = ctx.local_date(noon());

            let a = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 2)]))
                .await
                .unwrap();
            let b = orders
                .create_order(request(vec![LineRequest::new(LARB, 1), LineRequest::new(STICKY_RICE, 3)]))
                .await
                .unwrap();
            let (pa, _) = orders
                .process_payment(&a.id, PaymentRequest::electronic(PaymentMethod::Promptpay, None))
                .await
                .unwrap();
            orders
                .process_payment(&b.id, PaymentRequest::electronic(PaymentMethod::Promptpay, None))
                .await
                .unwrap();

            let stat = ctx.store().get_daily_stat(today).await.unwrap().unwrap();
            assert_eq!(stat.total_orders, 2, "{name}");
            assert_eq!(stat.total_revenue_cents, a.total_cents + b.total_cents, "{name}");
            assert_eq!(stat.total_items, 6, "{name}");

            orders.refund_payment(&pa.id, None).await.unwrap();
            let stat = ctx.store().get_daily_stat(today).await.unwrap().unwrap();
            assert_eq!(stat.total_orders, 1, "{name}");
            assert_eq!(stat.total_revenue_cents, b.total_cents, "{name}");
            assert_eq!(stat.total_items, 4, "{name}");

            // Corrupt the cache, then rebuild from payments
            ctx.store().put_daily_stat(&DailyStat::empty(today)).await.unwrap();
            let rebuilt = orders.rebuild_daily_stat(today).await.unwrap();
            assert_eq!(rebuilt, stat, "{name}");
            assert_eq!(ctx.store().get_daily_stat(today).await.unwrap(), Some(stat), "{name}");
        }
    }

    #[tokio::test]
    async fn test_refund_without_daily_stat_still_succeeds() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            let mut order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1)]))
                .await
                .unwrap();

            // Settled straight through the store: no aggregate row exists
            let payment = settle(&mut order, &PaymentRequest::cash(5000), "p-raw".into(), noon()).unwrap();
            ctx.store().settle_payment(&payment, &order).await.unwrap();
            assert_eq!(ctx.store().get_daily_stat(ctx.local_date(noon())).await.unwrap(), None, "{name}");

            let (refunded, order) = orders.refund_payment(&payment.id, None).await.unwrap();
            assert_eq!(refunded.status, PaymentState::Refunded, "{name}");
            assert_eq!(order.payment_status, PaymentStatus::Refunded, "{name}");
            assert_eq!(ctx.store().get_daily_stat(ctx.local_date(noon())).await.unwrap(), None, "{name}");
        }
    }

    #[tokio::test]
    async fn test_receipt_uses_shop_settings() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            ctx.store()
                .put_settings(&[("shop_name".into(), "Somtam Nua".into())], noon())
                .await
                .unwrap();

            let order = orders
                .create_order(request(vec![LineRequest::new(SOM_TAM, 1).with_addons([SALTED_EGG])]))
                .await
                .unwrap();
            let (payment, _) = orders
                .process_payment(&order.id, PaymentRequest::cash(10000))
                .await
                .unwrap();

            let receipt = orders.receipt(&payment.id).await.unwrap();
            assert_eq!(receipt.shop_name, "Somtam Nua", "{name}");
            assert_eq!(receipt.order_number, order.order_number, "{name}");
            assert_eq!(receipt.total_cents, order.total_cents, "{name}");
        }
    }

    #[tokio::test]
    async fn test_unknown_addon_policy_from_settings() {
        for (name, ctx, _) in contexts().await {
            let orders = OrderService::new(ctx.clone());
            let line = LineRequest::new(SOM_TAM, 1).with_addons([SALTED_EGG, "ghost"]);

            let priced = orders.price_order(std::slice::from_ref(&line)).await.unwrap();
            assert_eq!(priced.lines[0].addons.len(), 1, "{name}");
            assert_eq!(priced.totals.subtotal_cents, 5500, "{name}");

            ctx.store()
                .put_settings(&[("unknown_addon_policy".into(), "reject".into())], noon())
                .await
                .unwrap();
            let err = core_err(orders.price_order(&[line]).await.unwrap_err());
            assert_eq!(err, CoreError::UnknownAddon("ghost".into()), "{name}");
        }
    }
}

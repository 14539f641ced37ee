// apps/orders_service/src/pipelines/checkout_pipeline.rs

//! The checkout saga: persist the order, settle payment, record the
//! outcome, clear the cart, confirm. Only the first step can fail the
//! checkout; every later step degrades.

use crate::errors::AppError;
use crate::models::{Order, OrderStatus, PaymentStatus};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::{PaymentReceipt, PaymentRequest, ServiceAudience};
use checkout_saga::{Saga, SagaData, SkipCondition, StepControl, StepPolicy};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const CREATE_ORDER: &str = "create_order";
pub const SETTLE_PAYMENT: &str = "settle_payment";
pub const RECORD_SETTLEMENT: &str = "record_settlement";
pub const CLEAR_CART: &str = "clear_cart";
pub const SEND_CONFIRMATION: &str = "send_confirmation";

const SETTLEMENT_SAVE_ATTEMPTS: u32 = 3;

pub fn build_checkout_saga() -> Saga<CheckoutCtxData, AppError> {
  build("checkout")
}

/// Checkout for an order that is already persisted: everything from
/// settlement on. A receipt placed in the context beforehand is applied
/// without contacting the payment authority.
pub fn build_recovery_saga() -> Saga<CheckoutCtxData, AppError> {
  let mut saga = build("checkout_recovery");
  saga.remove_step(CREATE_ORDER);
  saga
}

fn build(name: &str) -> Saga<CheckoutCtxData, AppError> {
  let already_settled: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx: SagaData<CheckoutCtxData>| ctx.read().receipt.is_some());
  let no_receipt: SkipCondition<CheckoutCtxData> =
    Arc::new(|ctx: SagaData<CheckoutCtxData>| ctx.read().receipt.is_none());
  let settlement_not_completed: SkipCondition<CheckoutCtxData> = Arc::new(|ctx: SagaData<CheckoutCtxData>| {
    !ctx.read().receipt.as_ref().map_or(false, PaymentReceipt::is_completed)
  });

  let mut saga = Saga::<CheckoutCtxData, AppError>::new(
    name,
    &[
      (CREATE_ORDER, StepPolicy::Fatal, None),
      (SETTLE_PAYMENT, StepPolicy::BestEffort, Some(already_settled)),
      (RECORD_SETTLEMENT, StepPolicy::BestEffort, Some(no_receipt)),
      (CLEAR_CART, StepPolicy::BestEffort, Some(settlement_not_completed)),
      (SEND_CONFIRMATION, StepPolicy::BestEffort, None),
    ],
  );

  saga.on_step(CREATE_ORDER, create_order);
  saga.on_step(SETTLE_PAYMENT, settle_payment);
  saga.annotate_step(SETTLE_PAYMENT, |ctx: SagaData<CheckoutCtxData>| {
    let receipt = ctx.read().receipt.clone();
    receipt.and_then(|r| serde_json::to_string(&r).ok())
  });
  saga.on_step(RECORD_SETTLEMENT, record_settlement);
  saga.on_step(CLEAR_CART, clear_cart);
  saga.on_step(SEND_CONFIRMATION, send_confirmation);
  saga
}

#[instrument(name = "checkout::create_order", skip_all)]
async fn create_order(ctx: SagaData<CheckoutCtxData>) -> Result<StepControl, AppError> {
  let (orders, order) = {
    let guard = ctx.read();
    (guard.app_state.orders.clone(), guard.order.clone())
  };

  orders.insert(&order).await.map_err(|e| match e {
    AppError::Persistence(_) => e,
    other => AppError::Persistence(other.to_string()),
  })?;
  info!(order_id = %order.id, user_id = %order.user_id, total = %order.total_amount, "Order persisted as pending.");
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::settle_payment", skip_all)]
async fn settle_payment(ctx: SagaData<CheckoutCtxData>) -> Result<StepControl, AppError> {
  let (state, customer, request) = {
    let guard = ctx.read();
    (
      guard.app_state.clone(),
      guard.customer.clone(),
      PaymentRequest {
        order_id: guard.order.id,
        amount: guard.order.total_amount,
        payment_method: guard.order.payment.method.clone(),
      },
    )
  };

  let token = state.tokens.mint(&customer, ServiceAudience::Payment)?;
  let receipt = state.payments.process(&request, &token).await?;
  info!(
    order_id = %request.order_id,
    transaction_id = %receipt.transaction_id,
    status = ?receipt.status,
    "Settlement obtained."
  );
  ctx.write().receipt = Some(receipt);
  Ok(StepControl::Continue)
}

/// Applies the receipt to the stored order. Starts from the stored copy and
/// reloads it if another write lands first, so a status change made since
/// checkout began (a cancellation, say) is kept.
#[instrument(name = "checkout::record_settlement", skip_all)]
async fn record_settlement(ctx: SagaData<CheckoutCtxData>) -> Result<StepControl, AppError> {
  let (orders, order_id, receipt) = {
    let guard = ctx.read();
    (guard.app_state.orders.clone(), guard.order.id, guard.receipt.clone())
  };
  let Some(receipt) = receipt else {
    return Ok(StepControl::Continue);
  };

  let mut attempt = 1;
  let order = loop {
    let mut order = orders
      .find_by_id(order_id)
      .await?
      .ok_or_else(|| AppError::NotFound(format!("Order {} disappeared before settlement was recorded", order_id)))?;
    let loaded = order.status;
    apply_receipt(&mut order, &receipt)?;
    match orders.save(&order, loaded).await {
      Ok(()) => break order,
      Err(AppError::InvalidState(reason)) if attempt < SETTLEMENT_SAVE_ATTEMPTS => {
        warn!(%order_id, attempt, %reason, "Order changed while recording settlement; reloading.");
        attempt += 1;
      }
      Err(e) => return Err(e),
    }
  };

  info!(%order_id, status = %order.status, payment_status = order.payment.status.as_str(), "Settlement recorded.");
  ctx.write().order = order;
  Ok(StepControl::Continue)
}

fn apply_receipt(order: &mut Order, receipt: &PaymentReceipt) -> Result<(), AppError> {
  order.payment.transaction_id = Some(receipt.transaction_id.clone());
  order.payment.status = PaymentStatus::from(receipt.status);
  if receipt.is_completed() {
    if order.status == OrderStatus::Pending {
      order.status = order.status.transition_to(OrderStatus::Processing)?;
    } else {
      warn!(order_id = %order.id, status = %order.status, "Settlement completed but order is no longer pending; status kept.");
    }
  }
  order.touch();
  Ok(())
}

#[instrument(name = "checkout::clear_cart", skip_all)]
async fn clear_cart(ctx: SagaData<CheckoutCtxData>) -> Result<StepControl, AppError> {
  let (state, customer) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.customer.clone())
  };

  let token = state.tokens.mint(&customer, ServiceAudience::Cart)?;
  state.carts.clear_cart(&customer.id, &token).await?;
  info!(user_id = %customer.id, "Cart cleared after checkout.");
  ctx.write().cart_cleared = true;
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::send_confirmation", skip_all)]
async fn send_confirmation(ctx: SagaData<CheckoutCtxData>) -> Result<StepControl, AppError> {
  let (state, email) = {
    let guard = ctx.read();
    (guard.app_state.clone(), common_steps::confirmation_email(&guard.order))
  };

  let control = common_steps::send_email(&state, email).await?;
  ctx.write().confirmation_sent = true;
  Ok(control)
}

// apps/orders_service/src/pipelines/lifecycle_pipeline.rs

//! Sagas for changes made to an order after checkout: an administrator
//! moving it along the status graph, and the owner canceling it.

use crate::errors::AppError;
use crate::models::{parse_order_id, OrderStatus};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{CancelCtxData, StatusUpdateCtxData};
use checkout_saga::{Saga, SagaData, StepControl, StepPolicy};
use tracing::{info, instrument, warn};

pub const AUTHORIZE_REQUESTER: &str = "authorize_requester";
pub const APPLY_STATUS: &str = "apply_status";
pub const NOTIFY_STATUS_CHANGE: &str = "notify_status_change";

pub const APPLY_CANCELLATION: &str = "apply_cancellation";
pub const NOTIFY_CANCELLATION: &str = "notify_cancellation";

pub fn build_status_update_saga() -> Saga<StatusUpdateCtxData, AppError> {
  let mut saga = Saga::<StatusUpdateCtxData, AppError>::new(
    "order_status_update",
    &[
      (AUTHORIZE_REQUESTER, StepPolicy::Fatal, None),
      (APPLY_STATUS, StepPolicy::Fatal, None),
      (NOTIFY_STATUS_CHANGE, StepPolicy::BestEffort, None),
    ],
  );

  saga.on_step(AUTHORIZE_REQUESTER, |ctx: SagaData<StatusUpdateCtxData>| async move {
    let requester = ctx.read().requester.clone();
    if !requester.is_admin() {
      warn!(user_id = %requester.id, "Non-admin attempted a status update.");
      return Err(AppError::Unauthorized("Only administrators can update order status".to_string()));
    }
    Ok::<_, AppError>(StepControl::Continue)
  });
  saga.on_step(APPLY_STATUS, apply_status);
  saga.on_step(NOTIFY_STATUS_CHANGE, |ctx: SagaData<StatusUpdateCtxData>| async move {
    let (state, order) = {
      let guard = ctx.read();
      (guard.app_state.clone(), guard.order.clone())
    };
    let Some(order) = order else {
      return Ok(StepControl::Continue);
    };
    let control = common_steps::send_email(&state, common_steps::status_update_email(&order)).await?;
    ctx.write().notified = true;
    Ok::<_, AppError>(control)
  });
  saga
}

#[instrument(name = "lifecycle::apply_status", skip_all)]
async fn apply_status(ctx: SagaData<StatusUpdateCtxData>) -> Result<StepControl, AppError> {
  let (orders, order_ref, requested) = {
    let guard = ctx.read();
    (
      guard.app_state.orders.clone(),
      guard.order_ref.clone(),
      guard.requested_status.clone(),
    )
  };

  let next: OrderStatus = requested.parse()?;
  let order_id = parse_order_id(&order_ref)?;
  let mut order = orders
    .find_by_id(order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  let previous = order.status;
  order.status = order.status.transition_to(next)?;
  order.touch();
  orders.save(&order, previous).await?;

  info!(%order_id, from = %previous, to = %order.status, "Order status updated.");
  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

pub fn build_cancel_saga() -> Saga<CancelCtxData, AppError> {
  let mut saga = Saga::<CancelCtxData, AppError>::new(
    "order_cancel",
    &[
      (APPLY_CANCELLATION, StepPolicy::Fatal, None),
      (NOTIFY_CANCELLATION, StepPolicy::BestEffort, None),
    ],
  );

  saga.on_step(APPLY_CANCELLATION, apply_cancellation);
  saga.on_step(NOTIFY_CANCELLATION, |ctx: SagaData<CancelCtxData>| async move {
    let (state, order) = {
      let guard = ctx.read();
      (guard.app_state.clone(), guard.order.clone())
    };
    let Some(order) = order else {
      return Ok(StepControl::Continue);
    };
    let control = common_steps::send_email(&state, common_steps::cancellation_email(&order)).await?;
    ctx.write().notified = true;
    Ok::<_, AppError>(control)
  });
  saga
}

/// Only the owner may cancel; anyone else sees the same `NotFound` as for
/// an order that does not exist.
#[instrument(name = "lifecycle::apply_cancellation", skip_all)]
async fn apply_cancellation(ctx: SagaData<CancelCtxData>) -> Result<StepControl, AppError> {
  let (orders, order_id, user_id) = {
    let guard = ctx.read();
    (guard.app_state.orders.clone(), guard.order_id, guard.requester.id.clone())
  };

  let mut order = orders
    .find_for_user(order_id, &user_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;

  if !order.status.is_cancelable() {
    return Err(AppError::InvalidState("Order cannot be canceled".to_string()));
  }
  let loaded = order.status;
  order.status = loaded.transition_to(OrderStatus::Canceled)?;
  order.touch();
  orders.save(&order, loaded).await?;

  info!(%order_id, %user_id, "Order canceled.");
  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

// apps/orders_service/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use checkout_saga::SagaData;
use tracing::{info, instrument, warn};

use crate::errors::AppError;
use crate::models::{parse_order_id, CreateOrderRequest, Order, StatusUpdateRequest};
use crate::pipelines::contexts::{CancelCtxData, CheckoutCtxData, StatusUpdateCtxData};
use crate::services::AuthenticatedUser;
use crate::state::AppState;

#[instrument(
    name = "handler::create_order",
    skip(app_state, auth_user, req_payload),
    fields(user_id = %auth_user.id)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  req_payload: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse, AppError> {
  let request = req_payload.into_inner();
  request.validate()?;

  let order = Order::new_pending(&auth_user.id, &auth_user.email, request);
  let saga_id = order.id.to_string();
  info!(order_id = %saga_id, total = %order.total_amount, items = order.items.len(), "Checkout starting.");

  let ctx = SagaData::new(CheckoutCtxData::new(app_state.get_ref().clone(), auth_user, order));
  let report = app_state.sagas.checkout.run(&saga_id, ctx.clone()).await?;

  let final_ctx = ctx.snapshot();
  if !report.degraded_steps().is_empty() {
    warn!(
      order_id = %saga_id,
      degraded = ?report.degraded_steps(),
      status = %final_ctx.order.status,
      "Checkout finished with degraded steps."
    );
  }
  info!(
    order_id = %saga_id,
    status = %final_ctx.order.status,
    payment_status = final_ctx.order.payment.status.as_str(),
    cart_cleared = final_ctx.cart_cleared,
    confirmation_sent = final_ctx.confirmation_sent,
    "Checkout finished."
  );
  Ok(HttpResponse::Created().json(final_ctx.order))
}

#[instrument(name = "handler::list_orders", skip(app_state, auth_user), fields(user_id = %auth_user.id))]
pub async fn list_orders_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
  let orders = app_state.orders.list_for_user(&auth_user.id).await?;
  Ok(HttpResponse::Ok().json(orders))
}

#[instrument(name = "handler::get_order", skip(app_state, auth_user), fields(user_id = %auth_user.id))]
pub async fn get_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let order = app_state
    .orders
    .find_for_user(order_id, &auth_user.id)
    .await?
    .ok_or_else(|| AppError::NotFound("Order not found".to_string()))?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(
    name = "handler::update_order_status",
    skip(app_state, auth_user, req_payload),
    fields(user_id = %auth_user.id, requested = %req_payload.status)
)]
pub async fn update_order_status_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
  req_payload: web::Json<StatusUpdateRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx = SagaData::new(StatusUpdateCtxData::new(
    app_state.get_ref().clone(),
    auth_user,
    path.into_inner(),
    req_payload.into_inner().status,
  ));
  let report = app_state.sagas.status_update.run("status_update", ctx.clone()).await?;
  if !report.degraded_steps().is_empty() {
    warn!(degraded = ?report.degraded_steps(), "Status update finished with degraded steps.");
  }

  let order = ctx.read().order.clone();
  let order = order.ok_or_else(|| AppError::Internal("Status update finished without an order".to_string()))?;
  Ok(HttpResponse::Ok().json(order))
}

#[instrument(name = "handler::cancel_order", skip(app_state, auth_user), fields(user_id = %auth_user.id))]
pub async fn cancel_order_handler(
  app_state: web::Data<AppState>,
  auth_user: AuthenticatedUser,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let order_id = parse_order_id(&path.into_inner())?;
  let ctx = SagaData::new(CancelCtxData::new(app_state.get_ref().clone(), auth_user, order_id));
  let report = app_state.sagas.cancel.run(&order_id.to_string(), ctx.clone()).await?;
  if !report.degraded_steps().is_empty() {
    warn!(%order_id, degraded = ?report.degraded_steps(), "Cancellation finished with degraded steps.");
  }

  let order = ctx.read().order.clone();
  let order = order.ok_or_else(|| AppError::Internal("Cancellation finished without an order".to_string()))?;
  Ok(HttpResponse::Ok().json(order))
}

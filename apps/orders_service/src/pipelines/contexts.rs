// apps/orders_service/src/pipelines/contexts.rs

//! Shared state for each saga. Handlers receive these wrapped in
//! `checkout_saga::SagaData`.

use crate::models::Order;
use crate::services::{AuthenticatedUser, PaymentReceipt};
use crate::state::AppState;
use uuid::Uuid;

/// State of a checkout (or of its recovery run).
#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  /// The user the order belongs to; downstream tokens are minted for them.
  pub customer: AuthenticatedUser,
  /// The last persisted version of the order.
  pub order: Order,
  pub receipt: Option<PaymentReceipt>,
  pub cart_cleared: bool,
  pub confirmation_sent: bool,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, customer: AuthenticatedUser, order: Order) -> Self {
    Self {
      app_state,
      customer,
      order,
      receipt: None,
      cart_cleared: false,
      confirmation_sent: false,
    }
  }
}

#[derive(Clone)]
pub struct StatusUpdateCtxData {
  pub app_state: AppState,
  pub requester: AuthenticatedUser,
  /// Raw path segment and body value; both are parsed only after the
  /// requester is authorized.
  pub order_ref: String,
  pub requested_status: String,
  pub order: Option<Order>,
  pub notified: bool,
}

impl StatusUpdateCtxData {
  pub fn new(app_state: AppState, requester: AuthenticatedUser, order_ref: String, requested_status: String) -> Self {
    Self {
      app_state,
      requester,
      order_ref,
      requested_status,
      order: None,
      notified: false,
    }
  }
}

#[derive(Clone)]
pub struct CancelCtxData {
  pub app_state: AppState,
  pub requester: AuthenticatedUser,
  pub order_id: Uuid,
  pub order: Option<Order>,
  pub notified: bool,
}

impl CancelCtxData {
  pub fn new(app_state: AppState, requester: AuthenticatedUser, order_id: Uuid) -> Self {
    Self {
      app_state,
      requester,
      order_id,
      order: None,
      notified: false,
    }
  }
}

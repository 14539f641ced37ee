// apps/orders_service/src/pipelines/common_steps.rs

//! Notification payloads shared by the order sagas.

use crate::errors::AppError;
use crate::models::Order;
use crate::services::EmailNotification;
use crate::state::AppState;
use checkout_saga::StepControl;
use serde_json::json;
use tracing::{info, instrument};

pub const ORDER_CONFIRMATION_TEMPLATE: &str = "order-confirmation";
pub const ORDER_STATUS_UPDATE_TEMPLATE: &str = "order-status-update";
pub const ORDER_CANCELLATION_TEMPLATE: &str = "order-cancellation";

pub fn confirmation_email(order: &Order) -> EmailNotification {
  EmailNotification {
    to: order.contact_email.clone(),
    subject: format!("Order Confirmation #{}", order.id),
    template_name: ORDER_CONFIRMATION_TEMPLATE.to_string(),
    data: json!({
      "orderId": order.id,
      "items": order.items,
      "totalAmount": order.total_amount,
      "shippingAddress": order.shipping_address,
      "status": order.status,
    }),
  }
}

pub fn status_update_email(order: &Order) -> EmailNotification {
  EmailNotification {
    to: order.contact_email.clone(),
    subject: format!("Order Status Update #{}", order.id),
    template_name: ORDER_STATUS_UPDATE_TEMPLATE.to_string(),
    data: json!({ "orderId": order.id, "status": order.status }),
  }
}

pub fn cancellation_email(order: &Order) -> EmailNotification {
  EmailNotification {
    to: order.contact_email.clone(),
    subject: format!("Order Cancellation #{}", order.id),
    template_name: ORDER_CANCELLATION_TEMPLATE.to_string(),
    data: json!({ "orderId": order.id }),
  }
}

#[instrument(name = "common_step::send_email", skip(app_state, email), fields(template = %email.template_name))]
pub async fn send_email(app_state: &AppState, email: EmailNotification) -> Result<StepControl, AppError> {
  app_state.notifier.send_email(&email).await?;
  info!(to = %email.to, subject = %email.subject, "Notification sent.");
  Ok(StepControl::Continue)
}

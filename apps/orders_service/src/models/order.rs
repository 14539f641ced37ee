// apps/orders_service/src/models/order.rs

use crate::errors::{AppError, Result};
use crate::models::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Processing,
  Shipped,
  Delivered,
  Canceled,
}

impl OrderStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Canceled => "canceled",
    }
  }

  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    use OrderStatus::*;
    matches!(
      (self, next),
      (Pending, Processing) | (Pending, Canceled) | (Processing, Shipped) | (Processing, Canceled) | (Shipped, Delivered)
    )
  }

  pub fn is_cancelable(self) -> bool {
    self.can_transition_to(OrderStatus::Canceled)
  }

  pub fn transition_to(self, next: OrderStatus) -> Result<OrderStatus> {
    if self.can_transition_to(next) {
      Ok(next)
    } else {
      Err(AppError::InvalidState(format!(
        "Order cannot move from '{}' to '{}'",
        self, next
      )))
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(OrderStatus::Pending),
      "processing" => Ok(OrderStatus::Processing),
      "shipped" => Ok(OrderStatus::Shipped),
      "delivered" => Ok(OrderStatus::Delivered),
      "canceled" => Ok(OrderStatus::Canceled),
      other => Err(AppError::Validation(format!("Unknown order status '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Completed,
  Failed,
}

impl PaymentStatus {
  pub fn as_str(self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Completed => "completed",
      PaymentStatus::Failed => "failed",
    }
  }
}

impl FromStr for PaymentStatus {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s {
      "pending" => Ok(PaymentStatus::Pending),
      "completed" => Ok(PaymentStatus::Completed),
      "failed" => Ok(PaymentStatus::Failed),
      other => Err(AppError::Internal(format!("Unknown payment status '{}'", other))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
  pub product_id: String,
  pub name: String,
  pub price: Money,
  pub quantity: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
  pub street: String,
  pub city: String,
  pub state: String,
  pub zip_code: String,
  pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
  pub method: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub transaction_id: Option<String>,
  pub status: PaymentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub user_id: String,
  pub contact_email: String,
  pub items: Vec<OrderItem>,
  pub total_amount: Money,
  pub shipping_address: ShippingAddress,
  pub payment: PaymentInfo,
  pub status: OrderStatus,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// A fresh `pending` order with a `pending` payment, built from an
  /// already validated request.
  pub fn new_pending(user_id: &str, contact_email: &str, request: CreateOrderRequest) -> Self {
    let now = Utc::now();
    Self {
      id: Uuid::new_v4(),
      user_id: user_id.to_string(),
      contact_email: contact_email.to_string(),
      items: request.items,
      total_amount: request.total_amount,
      shipping_address: request.shipping_address,
      payment: PaymentInfo {
        method: request.payment_info.method,
        transaction_id: None,
        status: PaymentStatus::Pending,
      },
      status: OrderStatus::Pending,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn items_total(&self) -> Option<Money> {
    sum_items(&self.items)
  }

  pub fn touch(&mut self) {
    self.updated_at = Utc::now();
  }
}

fn sum_items(items: &[OrderItem]) -> Option<Money> {
  Money::checked_total(items.iter().map(|item| (item.price, item.quantity)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfoRequest {
  pub method: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
  pub items: Vec<OrderItem>,
  pub total_amount: Money,
  pub shipping_address: ShippingAddress,
  pub payment_info: PaymentInfoRequest,
}

fn require(field: &str, value: &str) -> Result<()> {
  if value.trim().is_empty() {
    return Err(AppError::Validation(format!("{} is required", field)));
  }
  Ok(())
}

impl CreateOrderRequest {
  pub fn validate(&self) -> Result<()> {
    if self.items.is_empty() {
      return Err(AppError::Validation("Order must contain at least one item".to_string()));
    }
    for (idx, item) in self.items.iter().enumerate() {
      require(&format!("items[{}].productId", idx), &item.product_id)?;
      require(&format!("items[{}].name", idx), &item.name)?;
      if item.quantity < 1 {
        return Err(AppError::Validation(format!("items[{}].quantity must be at least 1", idx)));
      }
      if item.price.is_negative() {
        return Err(AppError::Validation(format!("items[{}].price must not be negative", idx)));
      }
    }

    if self.total_amount <= Money::ZERO {
      return Err(AppError::Validation("totalAmount must be positive".to_string()));
    }
    let items_total =
      sum_items(&self.items).ok_or_else(|| AppError::Validation("Item totals overflow".to_string()))?;
    if items_total != self.total_amount {
      return Err(AppError::Validation(format!(
        "totalAmount {} does not match the item total {}",
        self.total_amount, items_total
      )));
    }

    let address = &self.shipping_address;
    require("shippingAddress.street", &address.street)?;
    require("shippingAddress.city", &address.city)?;
    require("shippingAddress.state", &address.state)?;
    require("shippingAddress.zipCode", &address.zip_code)?;
    require("shippingAddress.country", &address.country)?;

    require("paymentInfo.method", &self.payment_info.method)
  }
}

/// Order ids arrive as path segments; anything that is not a UUID cannot
/// name an order.
pub fn parse_order_id(raw: &str) -> Result<Uuid> {
  Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Order not found".to_string()))
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusUpdateRequest {
  pub status: String,
}

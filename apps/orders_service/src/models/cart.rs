// apps/orders_service/src/models/cart.rs

use crate::errors::{AppError, Result};
use crate::models::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
  pub product_id: String,
  pub name: String,
  pub price: Money,
  pub quantity: i64,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

/// One cart per user; line items are keyed by product id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
  pub user_id: String,
  pub items: Vec<CartItem>,
  pub updated_at: DateTime<Utc>,
}

impl Cart {
  pub fn new(user_id: &str) -> Self {
    Self {
      user_id: user_id.to_string(),
      items: Vec::new(),
      updated_at: Utc::now(),
    }
  }

  /// Adds a line, merging quantities when the product is already present.
  pub fn add_item(&mut self, item: CartItem) -> Result<()> {
    if item.quantity < 1 {
      return Err(AppError::Validation("quantity must be at least 1".to_string()));
    }
    match self.items.iter_mut().find(|i| i.product_id == item.product_id) {
      Some(existing) => {
        existing.quantity = existing
          .quantity
          .checked_add(item.quantity)
          .ok_or_else(|| AppError::Validation("quantity is too large".to_string()))?;
      }
      None => self.items.push(item),
    }
    self.updated_at = Utc::now();
    Ok(())
  }

  /// Sets a line's quantity; zero or less removes the line.
  pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> Result<()> {
    let idx = self.position_of(product_id)?;
    if quantity <= 0 {
      self.items.remove(idx);
    } else {
      self.items[idx].quantity = quantity;
    }
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn remove_item(&mut self, product_id: &str) -> Result<()> {
    let idx = self.position_of(product_id)?;
    self.items.remove(idx);
    self.updated_at = Utc::now();
    Ok(())
  }

  pub fn clear(&mut self) {
    self.items.clear();
    self.updated_at = Utc::now();
  }

  pub fn total(&self) -> Result<Money> {
    Money::checked_total(self.items.iter().map(|i| (i.price, i.quantity)))
      .ok_or_else(|| AppError::Validation("Cart total overflows".to_string()))
  }

  fn position_of(&self, product_id: &str) -> Result<usize> {
    self
      .items
      .iter()
      .position(|i| i.product_id == product_id)
      .ok_or_else(|| AppError::NotFound(format!("Item '{}' not in cart", product_id)))
  }
}

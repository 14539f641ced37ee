// apps/orders_service/src/services/cart.rs

//! The cart store collaborator. Checkout only ever clears a cart; the
//! in-process cart book also carries the add/update/remove operations it
//! needs to stand in for the real cart service.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Cart, CartItem};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{debug, instrument};

const SERVICE: &str = "cart";

#[async_trait]
pub trait CartService: Send + Sync {
  async fn clear_cart(&self, user_id: &str, service_token: &str) -> AppResult<()>;
}

/// `DELETE {base_url}/` on the cart service; the user is identified by the
/// token's subject.
pub struct HttpCartService {
  client: reqwest::Client,
  base_url: String,
}

impl HttpCartService {
  pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
    Self {
      client,
      base_url: base_url.into(),
    }
  }
}

#[async_trait]
impl CartService for HttpCartService {
  #[instrument(name = "cart::clear", skip(self, service_token))]
  async fn clear_cart(&self, user_id: &str, service_token: &str) -> AppResult<()> {
    self
      .client
      .delete(format!("{}/", self.base_url))
      .bearer_auth(service_token)
      .send()
      .await
      .map_err(|e| AppError::downstream(SERVICE, e))?
      .error_for_status()
      .map_err(|e| AppError::downstream(SERVICE, e))?;
    Ok(())
  }
}

/// Process-local carts keyed by user id.
#[derive(Debug, Default)]
pub struct InMemoryCartBook {
  carts: RwLock<HashMap<String, Cart>>,
  clears: AtomicUsize,
}

impl InMemoryCartBook {
  pub fn new() -> Self {
    Self::default()
  }

  /// The user's cart, or an empty one if they never added anything.
  pub fn cart_for(&self, user_id: &str) -> Cart {
    self
      .carts
      .read()
      .get(user_id)
      .cloned()
      .unwrap_or_else(|| Cart::new(user_id))
  }

  pub fn add_item(&self, user_id: &str, item: CartItem) -> AppResult<Cart> {
    let mut carts = self.carts.write();
    let cart = carts.entry(user_id.to_string()).or_insert_with(|| Cart::new(user_id));
    cart.add_item(item)?;
    Ok(cart.clone())
  }

  pub fn update_quantity(&self, user_id: &str, product_id: &str, quantity: i64) -> AppResult<Cart> {
    self.with_existing(user_id, |cart| cart.update_quantity(product_id, quantity))
  }

  pub fn remove_item(&self, user_id: &str, product_id: &str) -> AppResult<Cart> {
    self.with_existing(user_id, |cart| cart.remove_item(product_id))
  }

  pub fn clear(&self, user_id: &str) -> AppResult<Cart> {
    self.with_existing(user_id, |cart| {
      cart.clear();
      Ok(())
    })
  }

  /// Number of clear requests that reached the book, successful or not.
  pub fn clear_requests(&self) -> usize {
    self.clears.load(Ordering::SeqCst)
  }

  fn with_existing(&self, user_id: &str, op: impl FnOnce(&mut Cart) -> AppResult<()>) -> AppResult<Cart> {
    let mut carts = self.carts.write();
    let cart = carts
      .get_mut(user_id)
      .ok_or_else(|| AppError::NotFound("Cart not found".to_string()))?;
    op(cart)?;
    Ok(cart.clone())
  }
}

#[async_trait]
impl CartService for InMemoryCartBook {
  async fn clear_cart(&self, user_id: &str, _service_token: &str) -> AppResult<()> {
    self.clears.fetch_add(1, Ordering::SeqCst);
    self.clear(user_id)?;
    debug!(%user_id, "In-memory cart cleared.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::Money;

  fn item(product_id: &str) -> CartItem {
    CartItem {
      product_id: product_id.to_string(),
      name: "Thing".to_string(),
      price: Money::from_cents(999),
      quantity: 1,
      image_url: None,
    }
  }

  #[test]
  fn carts_are_per_user() {
    let book = InMemoryCartBook::new();
    book.add_item("alice", item("a")).unwrap();
    book.add_item("bob", item("b")).unwrap();
    assert_eq!(book.cart_for("alice").items[0].product_id, "a");
    assert_eq!(book.cart_for("bob").items[0].product_id, "b");
    assert!(book.cart_for("carol").items.is_empty());
  }

  #[test]
  fn operations_on_missing_cart_are_not_found() {
    let book = InMemoryCartBook::new();
    assert!(matches!(book.update_quantity("nobody", "a", 2), Err(AppError::NotFound(_))));
    assert!(matches!(book.remove_item("nobody", "a"), Err(AppError::NotFound(_))));
    assert!(matches!(book.clear("nobody"), Err(AppError::NotFound(_))));
  }

  #[tokio::test]
  async fn clear_through_service_trait_empties_the_cart() {
    let book = InMemoryCartBook::new();
    book.add_item("alice", item("a")).unwrap();
    book.clear_cart("alice", "token").await.unwrap();
    assert!(book.cart_for("alice").items.is_empty());
    assert_eq!(book.clear_requests(), 1);
  }
}

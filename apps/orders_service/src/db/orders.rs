// apps/orders_service/src/db/orders.rs

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Order, OrderStatus, PaymentStatus};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use uuid::Uuid;

#[async_trait]
pub trait OrderRepository: Send + Sync {
  /// Stores a new order. Fails if the id is taken.
  async fn insert(&self, order: &Order) -> AppResult<()>;

  /// Overwrites an existing order, provided its stored status is still
  /// `expected`. `NotFound` if it was never inserted, `InvalidState` if
  /// another write moved its status in the meantime.
  async fn save(&self, order: &Order, expected: OrderStatus) -> AppResult<()>;

  async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>>;

  /// Like `find_by_id`, but only when `user_id` owns the order.
  async fn find_for_user(&self, id: Uuid, user_id: &str) -> AppResult<Option<Order>>;

  /// The user's orders, newest first.
  async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>>;

  /// Orders still `pending` with a `pending` payment that were created
  /// before `created_before`, oldest first.
  async fn list_unsettled(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Order>>;
}

pub(crate) fn status_conflict(order: &Order, current: OrderStatus) -> AppError {
  AppError::InvalidState(format!("Order {} was changed concurrently and is now {}", order.id, current))
}

#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
  orders: RwLock<HashMap<Uuid, Order>>,
}

impl InMemoryOrderRepository {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl OrderRepository for InMemoryOrderRepository {
  async fn insert(&self, order: &Order) -> AppResult<()> {
    let mut orders = self.orders.write();
    if orders.contains_key(&order.id) {
      return Err(AppError::Persistence(format!("Order {} already exists", order.id)));
    }
    orders.insert(order.id, order.clone());
    Ok(())
  }

  async fn save(&self, order: &Order, expected: OrderStatus) -> AppResult<()> {
    match self.orders.write().get_mut(&order.id) {
      Some(stored) if stored.status == expected => {
        *stored = order.clone();
        Ok(())
      }
      Some(stored) => Err(status_conflict(order, stored.status)),
      None => Err(AppError::NotFound(format!("Order {} not found", order.id))),
    }
  }

  async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
    Ok(self.orders.read().get(&id).cloned())
  }

  async fn find_for_user(&self, id: Uuid, user_id: &str) -> AppResult<Option<Order>> {
    Ok(self.orders.read().get(&id).filter(|o| o.user_id == user_id).cloned())
  }

  async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>> {
    let mut found: Vec<Order> = self
      .orders
      .read()
      .values()
      .filter(|o| o.user_id == user_id)
      .cloned()
      .collect();
    found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Ok(found)
  }

  async fn list_unsettled(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Order>> {
    let mut found: Vec<Order> = self
      .orders
      .read()
      .values()
      .filter(|o| {
        o.status == OrderStatus::Pending && o.payment.status == PaymentStatus::Pending && o.created_at < created_before
      })
      .cloned()
      .collect();
    found.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(found)
  }
}

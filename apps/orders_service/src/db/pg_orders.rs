// apps/orders_service/src/db/pg_orders.rs

use crate::db::orders::{status_conflict, OrderRepository};
use crate::errors::{AppError, Result as AppResult};
use crate::models::{Money, Order, OrderItem, OrderStatus, PaymentInfo, ShippingAddress};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use tracing::instrument;
use uuid::Uuid;

const ORDER_COLUMNS: &str = "id, user_id, contact_email, items, total_amount_cents, shipping_address, \
   payment_method, payment_transaction_id, payment_status, status, created_at, updated_at";

#[derive(Debug, FromRow)]
struct OrderRow {
  id: Uuid,
  user_id: String,
  contact_email: String,
  items: Json<Vec<OrderItem>>,
  total_amount_cents: i64,
  shipping_address: Json<ShippingAddress>,
  payment_method: String,
  payment_transaction_id: Option<String>,
  payment_status: String,
  status: String,
  created_at: DateTime<Utc>,
  updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = AppError;

  fn try_from(row: OrderRow) -> AppResult<Self> {
    let id = row.id;
    let corrupt = |e: AppError| AppError::Persistence(format!("Order {} has an unreadable column: {}", id, e));
    Ok(Order {
      id,
      status: row.status.parse().map_err(corrupt)?,
      payment: PaymentInfo {
        status: row.payment_status.parse().map_err(corrupt)?,
        method: row.payment_method,
        transaction_id: row.payment_transaction_id,
      },
      user_id: row.user_id,
      contact_email: row.contact_email,
      items: row.items.0,
      total_amount: Money::from_cents(row.total_amount_cents),
      shipping_address: row.shipping_address.0,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

fn into_orders(rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
  rows.into_iter().map(Order::try_from).collect()
}

/// Orders in Postgres; items and address are JSONB columns.
#[derive(Clone)]
pub struct PgOrderRepository {
  pool: PgPool,
}

impl PgOrderRepository {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl OrderRepository for PgOrderRepository {
  #[instrument(name = "pg_orders::insert", skip(self, order), fields(order_id = %order.id), err(Display))]
  async fn insert(&self, order: &Order) -> AppResult<()> {
    sqlx::query(
      "INSERT INTO orders (id, user_id, contact_email, items, total_amount_cents, shipping_address, \
         payment_method, payment_transaction_id, payment_status, status, created_at, updated_at) \
       VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
    )
    .bind(order.id)
    .bind(&order.user_id)
    .bind(&order.contact_email)
    .bind(Json(&order.items))
    .bind(order.total_amount.cents())
    .bind(Json(&order.shipping_address))
    .bind(&order.payment.method)
    .bind(&order.payment.transaction_id)
    .bind(order.payment.status.as_str())
    .bind(order.status.as_str())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&self.pool)
    .await?;
    Ok(())
  }

  #[instrument(name = "pg_orders::save", skip(self, order), fields(order_id = %order.id), err(Display))]
  async fn save(&self, order: &Order, expected: OrderStatus) -> AppResult<()> {
    let result = sqlx::query(
      "UPDATE orders SET items = $2, total_amount_cents = $3, shipping_address = $4, payment_method = $5, \
         payment_transaction_id = $6, payment_status = $7, status = $8, updated_at = $9 \
       WHERE id = $1 AND status = $10",
    )
    .bind(order.id)
    .bind(Json(&order.items))
    .bind(order.total_amount.cents())
    .bind(Json(&order.shipping_address))
    .bind(&order.payment.method)
    .bind(&order.payment.transaction_id)
    .bind(order.payment.status.as_str())
    .bind(order.status.as_str())
    .bind(order.updated_at)
    .bind(expected.as_str())
    .execute(&self.pool)
    .await?;

    if result.rows_affected() == 0 {
      let current: Option<String> = sqlx::query_scalar("SELECT status FROM orders WHERE id = $1")
        .bind(order.id)
        .fetch_optional(&self.pool)
        .await?;
      return Err(match current {
        Some(status) => status_conflict(order, status.parse()?),
        None => AppError::NotFound(format!("Order {} not found", order.id)),
      });
    }
    Ok(())
  }

  async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS))
      .bind(id)
      .fetch_optional(&self.pool)
      .await?;
    row.map(Order::try_from).transpose()
  }

  async fn find_for_user(&self, id: Uuid, user_id: &str) -> AppResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {} FROM orders WHERE id = $1 AND user_id = $2",
      ORDER_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&self.pool)
    .await?;
    row.map(Order::try_from).transpose()
  }

  async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {} FROM orders WHERE user_id = $1 ORDER BY created_at DESC",
      ORDER_COLUMNS
    ))
    .bind(user_id)
    .fetch_all(&self.pool)
    .await?;
    into_orders(rows)
  }

  async fn list_unsettled(&self, created_before: DateTime<Utc>) -> AppResult<Vec<Order>> {
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
      "SELECT {} FROM orders \
       WHERE status = 'pending' AND payment_status = 'pending' AND created_at < $1 \
       ORDER BY created_at ASC",
      ORDER_COLUMNS
    ))
    .bind(created_before)
    .fetch_all(&self.pool)
    .await?;
    into_orders(rows)
  }
}

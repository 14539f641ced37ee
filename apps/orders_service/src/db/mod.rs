// apps/orders_service/src/db/mod.rs

//! Order storage and the durable intent journal.

pub mod orders;
pub mod pg_journal;
pub mod pg_orders;

pub use orders::{InMemoryOrderRepository, OrderRepository};
pub use pg_journal::PgIntentJournal;
pub use pg_orders::PgOrderRepository;

use crate::errors::Result as AppResult;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

const SCHEMA: &str = include_str!("schema.sql");

/// Connects and applies the schema.
pub async fn connect(database_url: &str) -> AppResult<PgPool> {
  let pool = PgPoolOptions::new().max_connections(10).connect(database_url).await?;
  sqlx::raw_sql(SCHEMA).execute(&pool).await?;
  tracing::info!("Database connected and schema applied.");
  Ok(pool)
}

// apps/orders_service/src/db/pg_journal.rs

use async_trait::async_trait;
use checkout_saga::{IntentEntry, IntentJournal, IntentPhase};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

#[derive(Debug, FromRow)]
struct IntentRow {
  saga_id: String,
  step: String,
  phase: String,
  detail: Option<String>,
  recorded_at: DateTime<Utc>,
}

/// Intent journal backed by the `saga_intents` table. Insertion order is
/// the `BIGSERIAL` id.
#[derive(Clone)]
pub struct PgIntentJournal {
  pool: PgPool,
}

impl PgIntentJournal {
  pub fn new(pool: PgPool) -> Self {
    Self { pool }
  }
}

#[async_trait]
impl IntentJournal for PgIntentJournal {
  async fn record(&self, entry: IntentEntry) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO saga_intents (saga_id, step, phase, detail, recorded_at) VALUES ($1, $2, $3, $4, $5)")
      .bind(&entry.saga_id)
      .bind(&entry.step)
      .bind(entry.phase.as_str())
      .bind(&entry.detail)
      .bind(entry.recorded_at)
      .execute(&self.pool)
      .await?;
    Ok(())
  }

  async fn history(&self, saga_id: &str) -> anyhow::Result<Vec<IntentEntry>> {
    let rows = sqlx::query_as::<_, IntentRow>(
      "SELECT saga_id, step, phase, detail, recorded_at FROM saga_intents WHERE saga_id = $1 ORDER BY id ASC",
    )
    .bind(saga_id)
    .fetch_all(&self.pool)
    .await?;

    rows
      .into_iter()
      .map(|row| {
        Ok(IntentEntry {
          phase: row.phase.parse::<IntentPhase>()?,
          saga_id: row.saga_id,
          step: row.step,
          detail: row.detail,
          recorded_at: row.recorded_at,
        })
      })
      .collect()
  }
}

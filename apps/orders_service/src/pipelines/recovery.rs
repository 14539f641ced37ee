// apps/orders_service/src/pipelines/recovery.rs

//! Background completion of checkouts that never reached a settlement
//! outcome (process crash, payment authority unreachable).
//!
//! An order qualifies when it is still `pending` with a `pending` payment
//! and older than the stale threshold. Its journal decides what happens:
//!  - a completed `settle_payment` entry carries the receipt, which is
//!    applied as-is without charging again;
//!  - otherwise (never started, interrupted, failed) settlement is requested
//!    again.

use crate::errors::Result as AppResult;
use crate::models::{Order, PaymentStatus};
use crate::pipelines::checkout_pipeline::SETTLE_PAYMENT;
use crate::pipelines::contexts::CheckoutCtxData;
use crate::services::{AuthenticatedUser, PaymentReceipt};
use crate::state::AppState;
use checkout_saga::{resolve_step, IntentEntry, IntentPhase, SagaData, StepResolution};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
  pub examined: usize,
  /// Orders whose payment now has a final status.
  pub settled: usize,
  pub still_pending: usize,
}

pub struct RecoverySweeper {
  state: AppState,
  stale_after: Duration,
}

impl RecoverySweeper {
  pub fn new(state: AppState) -> Self {
    let stale_after = state.config.recovery_stale_after;
    Self { state, stale_after }
  }

  pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
    self.stale_after = stale_after;
    self
  }

  #[instrument(name = "recovery::sweep_once", skip(self))]
  pub async fn sweep_once(&self) -> AppResult<SweepReport> {
    let stale_after = chrono::Duration::from_std(self.stale_after).unwrap_or_else(|_| chrono::Duration::zero());
    let cutoff = chrono::Utc::now() - stale_after;
    let candidates = self.state.orders.list_unsettled(cutoff).await?;

    let mut report = SweepReport::default();
    for order in candidates {
      report.examined += 1;
      let order_id = order.id;
      match self.recover(order).await {
        Ok(true) => report.settled += 1,
        Ok(false) => report.still_pending += 1,
        Err(e) => {
          warn!(%order_id, error = %e, "Recovery attempt failed; will retry on the next sweep.");
          report.still_pending += 1;
        }
      }
    }

    if report.examined > 0 {
      info!(
        examined = report.examined,
        settled = report.settled,
        still_pending = report.still_pending,
        "Recovery sweep finished."
      );
    }
    Ok(report)
  }

  /// Returns whether the order left the unsettled state.
  #[instrument(name = "recovery::recover", skip_all, fields(order_id = %order.id))]
  async fn recover(&self, order: Order) -> AppResult<bool> {
    let saga_id = order.id.to_string();
    let history = self.state.journal.history(&saga_id).await?;

    let recorded = recorded_receipt(&history);
    if recorded.is_some() {
      info!("Applying settlement recorded in the journal.");
    } else {
      let last = resolve_step(&history, SETTLE_PAYMENT);
      if last == StepResolution::InFlight {
        warn!("Settlement was interrupted mid-call; requesting it again.");
      } else {
        info!(last_phase = ?last, "No settlement on record; retrying payment.");
      }
    }

    let customer = AuthenticatedUser {
      id: order.user_id.clone(),
      email: order.contact_email.clone(),
      role: "user".to_string(),
    };
    let order_id = order.id;
    let mut ctx = CheckoutCtxData::new(self.state.clone(), customer, order);
    ctx.receipt = recorded;
    let saga_report = self.state.sagas.recovery.run(&saga_id, SagaData::new(ctx)).await?;
    if !saga_report.degraded_steps().is_empty() {
      warn!(degraded = ?saga_report.degraded_steps(), "Recovery run degraded.");
    }

    let settled = self
      .state
      .orders
      .find_by_id(order_id)
      .await?
      .map_or(false, |o| o.payment.status != PaymentStatus::Pending);
    Ok(settled)
  }

  /// Runs `sweep_once` every `interval` until the task is aborted.
  pub fn spawn(self, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
      let mut ticker = tokio::time::interval(interval);
      ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
      loop {
        ticker.tick().await;
        if let Err(e) = self.sweep_once().await {
          error!(error = %e, "Recovery sweep failed.");
        }
      }
    })
  }
}

/// The most recent receipt a completed `settle_payment` left in the journal.
/// Later skipped or failed entries do not hide it.
fn recorded_receipt(history: &[IntentEntry]) -> Option<PaymentReceipt> {
  history
    .iter()
    .rev()
    .filter(|e| e.step == SETTLE_PAYMENT && e.phase == IntentPhase::Completed)
    .find_map(|e| e.detail.as_deref())
    .and_then(|detail| match serde_json::from_str::<PaymentReceipt>(detail) {
      Ok(receipt) => Some(receipt),
      Err(e) => {
        warn!(error = %e, "Journaled receipt could not be decoded.");
        None
      }
    })
}

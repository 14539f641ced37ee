// apps/orders_service/src/pipelines/mod.rs

//! The order sagas, built once at startup and shared through `AppState`.

use crate::errors::AppError;
use checkout_saga::{IntentJournal, Saga};
use std::sync::Arc;

pub mod checkout_pipeline;
pub mod common_steps;
pub mod contexts;
pub mod lifecycle_pipeline;
pub mod recovery;

use contexts::{CancelCtxData, CheckoutCtxData, StatusUpdateCtxData};

pub use recovery::{RecoverySweeper, SweepReport};

pub struct OrderSagas {
  pub checkout: Saga<CheckoutCtxData, AppError>,
  pub recovery: Saga<CheckoutCtxData, AppError>,
  pub status_update: Saga<StatusUpdateCtxData, AppError>,
  pub cancel: Saga<CancelCtxData, AppError>,
}

impl OrderSagas {
  /// Checkout and recovery write intents to `journal` under the order id;
  /// the lifecycle sagas are short single-write flows and run unjournaled.
  pub fn new(journal: Arc<dyn IntentJournal>) -> Self {
    tracing::info!("Building order sagas...");
    let sagas = Self {
      checkout: checkout_pipeline::build_checkout_saga().with_journal(journal.clone()),
      recovery: checkout_pipeline::build_recovery_saga().with_journal(journal),
      status_update: lifecycle_pipeline::build_status_update_saga(),
      cancel: lifecycle_pipeline::build_cancel_saga(),
    };
    tracing::info!(
      checkout_steps = ?sagas.checkout.step_names(),
      recovery_steps = ?sagas.recovery.step_names(),
      "Order sagas ready."
    );
    sagas
  }
}

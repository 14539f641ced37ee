// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use checkout_saga::{InMemoryJournal, IntentEntry, IntentJournal, IntentPhase, SagaData, SagaError, StepControl};
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::Level;

#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub message: String,
  pub steps_executed: Vec<String>,
  pub should_halt_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Saga framework error: {0}")]
  Saga(String), // Debug text of the SagaError, kept as a String for Eq

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<SagaError> for TestError {
  fn from(se: SagaError) -> Self {
    TestError::Saga(format!("{:?}", se))
  }
}

pub fn create_simple_handler(
  step_name: &'static str,
  message_to_append: &'static str,
) -> checkout_saga::Handler<TestContext, TestError> {
  Box::new(move |ctx: SagaData<TestContext>| {
    let step_name_owned = step_name.to_string();
    Box::pin(async move {
      let mut guard = ctx.write();
      guard.counter += 1;
      guard.message.push_str(message_to_append);
      guard.steps_executed.push(step_name_owned.clone());
      tracing::debug!(target: "test_handlers", step = %step_name_owned, "executed, counter: {}", guard.counter);
      if guard.should_halt_at.as_deref() == Some(step_name_owned.as_str()) {
        return Ok(StepControl::Halt);
      }
      Ok(StepControl::Continue)
    })
  })
}

pub fn create_failing_handler(
  step_name: &'static str,
  error_message: &'static str,
) -> checkout_saga::Handler<TestContext, TestError> {
  Box::new(move |ctx: SagaData<TestContext>| {
    let step_name_owned = step_name.to_string();
    let error_message_owned = error_message.to_string();
    Box::pin(async move {
      ctx.write().steps_executed.push(step_name_owned.clone());
      tracing::warn!(target: "test_handlers", step = %step_name_owned, "failing with: '{}'", error_message_owned);
      Err(TestError::Handler(error_message_owned))
    })
  })
}

/// Journal that rejects every entry of one phase (optionally only for one
/// step) and stores the rest in memory.
pub struct FlakyJournal {
  pub inner: InMemoryJournal,
  pub reject_phase: IntentPhase,
  pub reject_step: Option<&'static str>,
}

impl FlakyJournal {
  pub fn rejecting(reject_phase: IntentPhase, reject_step: Option<&'static str>) -> Arc<Self> {
    Arc::new(Self {
      inner: InMemoryJournal::new(),
      reject_phase,
      reject_step,
    })
  }
}

#[async_trait]
impl IntentJournal for FlakyJournal {
  async fn record(&self, entry: IntentEntry) -> anyhow::Result<()> {
    let step_matches = self.reject_step.map_or(true, |s| s == entry.step);
    if entry.phase == self.reject_phase && step_matches {
      anyhow::bail!("journal unavailable");
    }
    self.inner.record(entry).await
  }

  async fn history(&self, saga_id: &str) -> anyhow::Result<Vec<IntentEntry>> {
    self.inner.history(saga_id).await
  }
}

pub fn phases_of(history: &[IntentEntry]) -> Vec<(String, IntentPhase)> {
  history.iter().map(|e| (e.step.clone(), e.phase)).collect()
}

static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

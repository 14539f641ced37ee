// tests/error_handling_tests.rs
mod common;

use checkout_saga::{IntentJournal, IntentPhase, Saga, SagaData, SagaError, StepControl, StepDisposition, StepPolicy};
use common::*;
use serial_test::serial;

#[tokio::test]
#[serial]
async fn test_fatal_step_without_handlers_is_reported() {
  setup_tracing();
  let saga = Saga::<TestContext, TestError>::new("missing", &[("missing", StepPolicy::Fatal, None)]);
  let err = saga
    .run("saga-missing", SagaData::new(TestContext::default()))
    .await
    .unwrap_err();
  match err {
    TestError::Saga(s) => {
      assert!(s.contains("HandlerMissing"));
      assert!(s.contains("missing"));
    }
    other => panic!("Expected TestError::Saga(HandlerMissing), got {:?}", other),
  }
}

#[tokio::test]
#[serial]
async fn test_saga_with_saga_error_type() {
  setup_tracing();
  let mut saga = Saga::<TestContext, SagaError>::new("native", &[("task", StepPolicy::Fatal, None)]);
  saga.on_step("task", |_ctx: SagaData<TestContext>| async move {
    Err::<StepControl, _>(anyhow::anyhow!("wrapped failure"))
  });

  let err = saga
    .run("saga-native", SagaData::new(TestContext::default()))
    .await
    .unwrap_err();
  match err {
    SagaError::HandlerError { source } => assert_eq!(source.to_string(), "wrapped failure"),
    other => panic!("Expected SagaError::HandlerError, got {:?}", other),
  }
}

#[test]
fn test_anyhow_conversion_unwraps_saga_errors() {
  let original = SagaError::StepNotFound {
    step_name: "x".to_string(),
  };
  let through_anyhow: SagaError = anyhow::Error::new(original).into();
  assert!(matches!(through_anyhow, SagaError::StepNotFound { step_name } if step_name == "x"));
}

#[tokio::test]
#[serial]
async fn test_fatal_step_aborts_when_start_cannot_be_journaled() {
  setup_tracing();
  let journal = FlakyJournal::rejecting(IntentPhase::Started, Some("charge"));
  let mut saga = Saga::<TestContext, TestError>::new("journaled", &[("charge", StepPolicy::Fatal, None)])
    .with_journal(journal.clone());
  saga.on_step("charge", create_simple_handler("charge", "C"));

  let ctx = SagaData::new(TestContext::default());
  let err = saga.run("saga-j1", ctx.clone()).await.unwrap_err();

  assert!(matches!(err, TestError::Saga(ref s) if s.contains("Journal")));
  assert!(ctx.read().steps_executed.is_empty(), "handler must not run without a start intent");
}

#[tokio::test]
#[serial]
async fn test_best_effort_step_is_degraded_when_start_cannot_be_journaled() {
  setup_tracing();
  let journal = FlakyJournal::rejecting(IntentPhase::Started, Some("notify"));
  let mut saga = Saga::<TestContext, TestError>::new(
    "journaled",
    &[("create", StepPolicy::Fatal, None), ("notify", StepPolicy::BestEffort, None)],
  )
  .with_journal(journal.clone());
  saga.on_step("create", create_simple_handler("create", "C"));
  saga.on_step("notify", create_simple_handler("notify", "N"));

  let ctx = SagaData::new(TestContext::default());
  let report = saga.run("saga-j2", ctx.clone()).await.unwrap();

  assert!(matches!(report.disposition_of("notify"), Some(StepDisposition::Degraded { .. })));
  assert_eq!(ctx.read().message, "C");
}

#[tokio::test]
#[serial]
async fn test_lost_completion_entry_does_not_fail_the_step() {
  setup_tracing();
  let journal = FlakyJournal::rejecting(IntentPhase::Completed, None);
  let mut saga = Saga::<TestContext, TestError>::new("journaled", &[("create", StepPolicy::Fatal, None)])
    .with_journal(journal.clone());
  saga.on_step("create", create_simple_handler("create", "C"));

  let report = saga
    .run("saga-j3", SagaData::new(TestContext::default()))
    .await
    .unwrap();
  assert_eq!(report.disposition_of("create"), Some(&StepDisposition::Done));

  let history = journal.history("saga-j3").await.unwrap();
  assert_eq!(phases_of(&history), vec![("create".to_string(), IntentPhase::Started)]);
}

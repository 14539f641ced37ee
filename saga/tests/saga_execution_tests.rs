// tests/saga_execution_tests.rs
mod common;

use checkout_saga::{Saga, SagaData, SagaOutcome, SkipCondition, StepControl, StepDisposition, StepPolicy};
use common::*;
use serial_test::serial;
use std::sync::Arc;

use StepPolicy::{BestEffort, Fatal};

#[tokio::test]
#[serial]
async fn test_saga_runs_steps_in_order() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(
    "ordered",
    &[("step1", Fatal, None), ("step2", Fatal, None), ("step3", BestEffort, None)],
  );

  saga.on_step("step1", create_simple_handler("step1", " S1"));
  saga.on_step("step2", create_simple_handler("step2", " S2"));
  saga.on_step("step3", create_simple_handler("step3", " S3"));

  let ctx = SagaData::new(TestContext::default());
  let report = saga.run("saga-1", ctx.clone()).await.unwrap();

  assert!(report.is_completed());
  assert!(report.degraded_steps().is_empty());
  assert_eq!(report.steps.len(), 3);

  let guard = ctx.read();
  assert_eq!(guard.counter, 3);
  assert_eq!(guard.message, " S1 S2 S3");
  assert_eq!(guard.steps_executed, vec!["step1", "step2", "step3"]);
}

#[tokio::test]
#[serial]
async fn test_before_on_after_run_in_phase_order() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new("phases", &[("only", Fatal, None)]);

  saga.after_step("only", create_simple_handler("after", "C"));
  saga.on_step("only", create_simple_handler("on", "B"));
  saga.before_step("only", create_simple_handler("before", "A"));

  let ctx = SagaData::new(TestContext::default());
  saga.run("saga-phases", ctx.clone()).await.unwrap();

  assert_eq!(ctx.read().message, "ABC");
}

#[tokio::test]
#[serial]
async fn test_halt_ends_saga_successfully() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(
    "halting",
    &[("stepA", Fatal, None), ("haltStep", Fatal, None), ("stepC", Fatal, None)],
  );

  saga.on_step("stepA", create_simple_handler("stepA", "A"));
  saga.on_step("haltStep", |ctx: SagaData<TestContext>| async move {
    ctx.write().steps_executed.push("haltStep".to_string());
    Ok::<_, TestError>(StepControl::Halt)
  });
  saga.on_step("stepC", create_simple_handler("stepC", "C"));

  let ctx = SagaData::new(TestContext::default());
  let report = saga.run("saga-halt", ctx.clone()).await.unwrap();

  assert_eq!(
    report.outcome,
    SagaOutcome::Halted {
      step: "haltStep".to_string()
    }
  );
  assert_eq!(report.disposition_of("haltStep"), Some(&StepDisposition::Halted));
  assert_eq!(report.disposition_of("stepC"), None);
  assert_eq!(ctx.read().steps_executed, vec!["stepA", "haltStep"]);
}

#[tokio::test]
#[serial]
async fn test_fatal_failure_aborts_remaining_steps() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(
    "fatal",
    &[("good_step", Fatal, None), ("bad_step", Fatal, None), ("another_step", BestEffort, None)],
  );

  saga.on_step("good_step", create_simple_handler("good_step", "Good"));
  saga.on_step("bad_step", create_failing_handler("bad_step", "I am a bad step!"));
  saga.on_step("another_step", create_simple_handler("another_step", "NeverRun"));

  let ctx = SagaData::new(TestContext::default());
  let err = saga.run("saga-fatal", ctx.clone()).await.unwrap_err();

  assert_eq!(err, TestError::Handler("I am a bad step!".to_string()));
  assert_eq!(ctx.read().steps_executed, vec!["good_step", "bad_step"]);
  assert_eq!(ctx.read().message, "Good");
}

#[tokio::test]
#[serial]
async fn test_best_effort_failure_degrades_and_continues() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new(
    "degrading",
    &[("first", Fatal, None), ("flaky", BestEffort, None), ("last", BestEffort, None)],
  );

  saga.on_step("first", create_simple_handler("first", "1"));
  saga.on_step("flaky", create_failing_handler("flaky", "downstream timeout"));
  saga.on_step("last", create_simple_handler("last", "3"));

  let ctx = SagaData::new(TestContext::default());
  let report = saga.run("saga-degrade", ctx.clone()).await.unwrap();

  assert!(report.is_completed());
  assert_eq!(report.degraded_steps(), vec!["flaky"]);
  match report.disposition_of("flaky") {
    Some(StepDisposition::Degraded { error }) => assert!(error.contains("downstream timeout")),
    other => panic!("Expected Degraded, got {:?}", other),
  }
  assert_eq!(report.disposition_of("last"), Some(&StepDisposition::Done));
  assert_eq!(ctx.read().message, "13");
}

#[tokio::test]
#[serial]
async fn test_skip_condition_sees_state_written_by_earlier_steps() {
  setup_tracing();
  let skip_when_counter_set: SkipCondition<TestContext> = Arc::new(|ctx: SagaData<TestContext>| {
    let counter = ctx.read().counter;
    counter > 0
  });
  let mut saga = Saga::<TestContext, TestError>::new(
    "skipping",
    &[("writer", Fatal, None), ("guarded", BestEffort, Some(skip_when_counter_set))],
  );

  saga.on_step("writer", create_simple_handler("writer", "W"));
  saga.on_step("guarded", create_simple_handler("guarded", "G"));

  let ctx = SagaData::new(TestContext::default());
  let report = saga.run("saga-skip", ctx.clone()).await.unwrap();

  assert_eq!(report.disposition_of("guarded"), Some(&StepDisposition::Skipped));
  assert_eq!(ctx.read().message, "W");
}

#[tokio::test]
#[serial]
async fn test_best_effort_step_without_handlers_is_skipped() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new("sparse", &[("a", Fatal, None), ("empty", BestEffort, None)]);
  saga.on_step("a", create_simple_handler("a", "A"));

  let report = saga
    .run("saga-sparse", SagaData::new(TestContext::default()))
    .await
    .unwrap();
  assert_eq!(report.disposition_of("empty"), Some(&StepDisposition::Skipped));
}

#[tokio::test]
#[serial]
async fn test_step_mutation() {
  setup_tracing();
  let mut saga = Saga::<TestContext, TestError>::new("mutable", &[("a", Fatal, None), ("c", Fatal, None)]);

  saga.insert_after_step("a", "b", BestEffort, None).unwrap();
  saga.insert_before_step("a", "start", Fatal, None).unwrap();
  assert_eq!(saga.step_names(), vec!["start", "a", "b", "c"]);
  assert!(saga.insert_after_step("nope", "x", Fatal, None).is_err());

  saga.on_step("start", create_simple_handler("start", "S"));
  saga.on_step("a", create_simple_handler("a", "A"));
  saga.on_step("b", create_simple_handler("b", "B"));
  saga.on_step("c", create_simple_handler("c", "C"));

  saga.remove_step("start");
  saga.remove_step("not-there");
  assert_eq!(saga.step_names(), vec!["a", "b", "c"]);

  saga.set_policy("c", BestEffort);
  assert_eq!(saga.policy_of("c"), Some(BestEffort));

  let ctx = SagaData::new(TestContext::default());
  saga.run("saga-mutation", ctx.clone()).await.unwrap();
  assert_eq!(ctx.read().message, "ABC");
}

#[test]
#[should_panic(expected = "not found in saga")]
fn test_registering_handler_for_unknown_step_panics() {
  let mut saga = Saga::<TestContext, TestError>::new("typo", &[("real", Fatal, None)]);
  saga.on_step("reel", create_simple_handler("reel", "x"));
}

// saga/src/core/control.rs

//! Signals handlers return, and the report a finished saga run produces.

/// Returned by a handler to say whether the saga keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  /// Run the remaining handlers of this step, then the following steps.
  Continue,
  /// End the saga here. Nothing after this handler runs; the run still
  /// counts as successful.
  Halt,
}

/// How a saga run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SagaOutcome {
  /// Every step was executed, skipped or degraded.
  Completed,
  /// A handler returned `StepControl::Halt` during the named step.
  Halted { step: String },
}

/// What happened to a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepDisposition {
  Done,
  Skipped,
  /// A best-effort step failed; the saga carried on without it.
  Degraded { error: String },
  Halted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
  pub name: String,
  pub disposition: StepDisposition,
}

/// Returned by `Saga::run` when the saga did not abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SagaReport {
  pub outcome: SagaOutcome,
  pub steps: Vec<StepRecord>,
}

impl SagaReport {
  pub(crate) fn new() -> Self {
    Self {
      outcome: SagaOutcome::Completed,
      steps: Vec::new(),
    }
  }

  pub(crate) fn push(&mut self, name: &str, disposition: StepDisposition) {
    self.steps.push(StepRecord {
      name: name.to_string(),
      disposition,
    });
  }

  pub fn disposition_of(&self, step_name: &str) -> Option<&StepDisposition> {
    self.steps.iter().find(|s| s.name == step_name).map(|s| &s.disposition)
  }

  /// Names of best-effort steps that failed during the run.
  pub fn degraded_steps(&self) -> Vec<&str> {
    self
      .steps
      .iter()
      .filter(|s| matches!(s.disposition, StepDisposition::Degraded { .. }))
      .map(|s| s.name.as_str())
      .collect()
  }

  pub fn is_completed(&self) -> bool {
    self.outcome == SagaOutcome::Completed
  }
}

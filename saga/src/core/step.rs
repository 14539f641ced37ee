// saga/src/core/step.rs

//! Step definitions: name, failure policy and skip condition.

use super::SagaData;

/// Evaluated against the saga state right before a step; `true` skips it.
pub type SkipCondition<TData> = std::sync::Arc<dyn Fn(SagaData<TData>) -> bool + Send + Sync + 'static>;

/// What a step's failure means for the saga as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
  /// An error aborts the saga and is returned to the caller.
  Fatal,
  /// An error is logged and journaled; the saga continues with the next step.
  BestEffort,
}

impl StepPolicy {
  pub fn is_best_effort(self) -> bool {
    matches!(self, StepPolicy::BestEffort)
  }
}

#[derive(Clone)]
pub struct StepDef<T: 'static + Send + Sync> {
  pub name: String,
  pub policy: StepPolicy,
  pub skip_if: Option<SkipCondition<T>>,
}

impl<T: 'static + Send + Sync> std::fmt::Debug for StepDef<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("policy", &self.policy)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

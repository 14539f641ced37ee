// saga/src/saga/definition.rs

//! The `Saga<TData, Err>` struct and its structural edits.

use crate::core::handler::{Annotator, Handler};
use crate::core::step::{SkipCondition, StepDef, StepPolicy};
use crate::error::SagaError;
use crate::journal::IntentJournal;
use std::collections::HashMap;
use std::sync::Arc;

/// An ordered list of named steps over a shared state `TData`, whose
/// handlers fail with `Err`.
///
/// `Err` must be constructible from `SagaError` so the engine can report its
/// own failures (missing handlers, journal write errors) through the same
/// channel as handler errors.
pub struct Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  pub(crate) name: String,
  pub(crate) steps: Vec<StepDef<TData>>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,

  pub(crate) annotators: HashMap<String, Annotator<TData>>,
  pub(crate) journal: Option<Arc<dyn IntentJournal>>,
}

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  /// Creates a saga from `(step name, policy, skip condition)` triples.
  pub fn new(name: impl Into<String>, step_defs: &[(&str, StepPolicy, Option<SkipCondition<TData>>)]) -> Self {
    let mut saga = Self {
      name: name.into(),
      steps: Vec::with_capacity(step_defs.len()),
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      annotators: HashMap::new(),
      journal: None,
    };
    for (step_name, policy, skip_if) in step_defs {
      saga.ensure_step_not_exists(step_name);
      saga.steps.push(StepDef {
        name: (*step_name).to_string(),
        policy: *policy,
        skip_if: skip_if.clone(),
      });
    }
    saga
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  pub fn policy_of(&self, step_name: &str) -> Option<StepPolicy> {
    self.steps.iter().find(|s| s.name == step_name).map(|s| s.policy)
  }

  /// Attaches the journal every subsequent run writes intents to.
  pub fn with_journal(mut self, journal: Arc<dyn IntentJournal>) -> Self {
    self.journal = Some(journal);
    self
  }

  pub fn set_journal(&mut self, journal: Option<Arc<dyn IntentJournal>>) {
    self.journal = journal;
  }

  /// Panics on unknown step names: a typo in a step name is a setup bug,
  /// not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Saga setup error: step '{}' not found in saga '{}'.",
        step_name, self.name
      );
    }
  }

  fn ensure_step_not_exists(&self, step_name: &str) {
    if self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Saga setup error: step '{}' already exists in saga '{}'.",
        step_name, self.name
      );
    }
  }

  fn position_of(&self, step_name: &str) -> Result<usize, SagaError> {
    self
      .steps
      .iter()
      .position(|s| s.name == step_name)
      .ok_or_else(|| SagaError::StepNotFound {
        step_name: step_name.to_string(),
      })
  }

  pub fn insert_before_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    policy: StepPolicy,
    skip_if: Option<SkipCondition<TData>>,
  ) -> Result<(), SagaError> {
    let idx = self.position_of(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx, StepDef { name, policy, skip_if });
    Ok(())
  }

  pub fn insert_after_step<S: Into<String>>(
    &mut self,
    existing_step_name: &str,
    new_step_name: S,
    policy: StepPolicy,
    skip_if: Option<SkipCondition<TData>>,
  ) -> Result<(), SagaError> {
    let idx = self.position_of(existing_step_name)?;
    let name: String = new_step_name.into();
    self.ensure_step_not_exists(&name);
    self.steps.insert(idx + 1, StepDef { name, policy, skip_if });
    Ok(())
  }

  /// Drops a step together with its handlers and annotator. Unknown names
  /// are a no-op.
  pub fn remove_step(&mut self, step_name: &str) {
    if let Ok(idx) = self.position_of(step_name) {
      self.steps.remove(idx);
      self.before.remove(step_name);
      self.on.remove(step_name);
      self.after.remove(step_name);
      self.annotators.remove(step_name);
    }
  }

  pub fn set_policy(&mut self, step_name: &str, policy: StepPolicy) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.policy = policy;
    }
  }

  pub fn set_skip_condition(&mut self, step_name: &str, skip_if: Option<SkipCondition<TData>>) {
    self.ensure_step_exists(step_name);
    if let Some(step) = self.steps.iter_mut().find(|s| s.name == step_name) {
      step.skip_if = skip_if;
    }
  }
}

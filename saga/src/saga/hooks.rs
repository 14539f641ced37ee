// saga/src/saga/hooks.rs

//! Registration of `before`, `on` and `after` handlers and of step
//! annotators.

use crate::core::control::StepControl;
use crate::core::handler::Handler;
use crate::core::saga_data::SagaData;
use crate::error::SagaError;
use crate::saga::definition::Saga;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

impl<TData, Err> Saga<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<SagaError> + Send + Sync + 'static,
{
  fn box_handler<F, UserErr>(handler_fn: impl Fn(SagaData<TData>) -> F + Send + Sync + 'static) -> Handler<TData, Err>
  where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    Box::new(move |data| {
      let user_fut = handler_fn(data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    })
  }

  /// Registers a handler that runs before the step's `on` handlers.
  pub fn before_step<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(SagaData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::box_handler(handler_fn);
    self.before.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers the main work of a step. Several `on` handlers run in
  /// registration order.
  pub fn on_step<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(SagaData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::box_handler(handler_fn);
    self.on.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn after_step<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(SagaData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<StepControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.ensure_step_exists(step_name);
    let handler = Self::box_handler(handler_fn);
    self.after.entry(step_name.to_string()).or_default().push(handler);
  }

  /// Registers a function whose output is stored as the detail of the
  /// step's `completed` journal entry. Replaces any earlier annotator.
  pub fn annotate_step(
    &mut self,
    step_name: &str,
    annotator: impl Fn(SagaData<TData>) -> Option<String> + Send + Sync + 'static,
  ) {
    self.ensure_step_exists(step_name);
    self.annotators.insert(step_name.to_string(), Arc::new(annotator));
    event!(Level::DEBUG, saga = %self.name, %step_name, "Step annotator set.");
  }

  pub(crate) fn has_handlers(&self, step_name: &str) -> bool {
    [&self.before, &self.on, &self.after]
      .iter()
      .any(|phase| phase.get(step_name).map_or(false, |v| !v.is_empty()))
  }
}

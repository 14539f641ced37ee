// saga/src/core/handler.rs

//! Boxed handler and annotator types stored by a `Saga`.

use crate::core::control::StepControl;
use crate::core::saga_data::SagaData;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A step handler: takes a clone of the shared saga state and resolves to a
/// `StepControl` or the saga's error type.
///
/// Handlers lock the state with `.read()` / `.write()` and must release the
/// guard before awaiting anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(SagaData<TData>) -> Pin<Box<dyn Future<Output = Result<StepControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// Produces the detail stored with a step's `completed` journal entry.
pub type Annotator<TData> = Arc<dyn Fn(SagaData<TData>) -> Option<String> + Send + Sync + 'static>;

// saga/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SagaError {
  #[error("Step not found: {step_name}")]
  StepNotFound { step_name: String },

  #[error("Handler missing for fatal step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Intent journal rejected the '{phase}' entry for step '{step_name}' of saga '{saga_id}'. Source: {source}")]
  Journal {
    saga_id: String,
    step_name: String,
    phase: String,
    #[source]
    source: AnyhowError,
  },

  #[error("Error in step handler or external operation. Source: {source}")]
  HandlerError {
    #[source]
    source: AnyhowError,
  },

  #[error("Configuration error for step '{step_name}': {message}")]
  ConfigurationError { step_name: String, message: String },

  #[error("Internal saga error: {0}")]
  Internal(String),
}

impl From<AnyhowError> for SagaError {
  fn from(err: AnyhowError) -> Self {
    // Unwrap one level so a SagaError that travelled through anyhow is not
    // reported as HandlerError(SagaError(..)).
    match err.downcast::<SagaError>() {
      Ok(saga_err) => saga_err,
      Err(other) => SagaError::HandlerError { source: other },
    }
  }
}

pub type SagaResult<T, E = SagaError> = std::result::Result<T, E>;

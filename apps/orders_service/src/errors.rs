// apps/orders_service/src/errors.rs

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use checkout_saga::SagaError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation Error: {0}")]
  Validation(String),

  #[error("Authentication Failed: {0}")]
  Auth(String),

  #[error("Unauthorized: {0}")]
  Unauthorized(String),

  #[error("Resource Not Found: {0}")]
  NotFound(String),

  #[error("Invalid State: {0}")]
  InvalidState(String),

  #[error("Persistence Error: {0}")]
  Persistence(String),

  #[error("Database Error: {0}")]
  Sqlx(#[from] sqlx::Error),

  #[error("Downstream service '{service}' unavailable: {message}")]
  Downstream { service: &'static str, message: String },

  #[error("Configuration Error: {0}")]
  Config(String),

  #[error("Saga Error: {source}")]
  Saga {
    #[from]
    source: SagaError,
  },

  #[error("Internal Server Error: {0}")]
  Internal(String),
}

impl AppError {
  pub fn downstream(service: &'static str, err: impl std::fmt::Display) -> Self {
    AppError::Downstream {
      service,
      message: err.to_string(),
    }
  }
}

impl From<anyhow::Error> for AppError {
  fn from(err: anyhow::Error) -> Self {
    match err.downcast::<AppError>() {
      Ok(app_err) => app_err,
      Err(err) => match err.downcast::<sqlx::Error>() {
        Ok(sqlx_err) => AppError::Sqlx(sqlx_err),
        Err(other) => AppError::Internal(other.to_string()),
      },
    }
  }
}

impl ResponseError for AppError {
  fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
      AppError::Auth(_) => StatusCode::UNAUTHORIZED,
      AppError::Unauthorized(_) => StatusCode::FORBIDDEN,
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Downstream { .. } => StatusCode::BAD_GATEWAY,
      AppError::Persistence(_)
      | AppError::Sqlx(_)
      | AppError::Config(_)
      | AppError::Saga { .. }
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }

  fn error_response(&self) -> HttpResponse {
    let status = self.status_code();
    if status.is_server_error() {
      tracing::error!(application_error = %self, "Responding with error");
    } else {
      tracing::warn!(application_error = %self, "Responding with error");
    }
    let body = match self {
      AppError::Validation(m)
      | AppError::Auth(m)
      | AppError::Unauthorized(m)
      | AppError::NotFound(m)
      | AppError::InvalidState(m) => json!({ "error": m }),
      AppError::Persistence(_) | AppError::Sqlx(_) => json!({ "error": "Database operation failed" }),
      AppError::Downstream { service, .. } => json!({ "error": format!("{} service unavailable", service) }),
      AppError::Config(m) => json!({ "error": "Configuration issue", "detail": m }),
      AppError::Saga { source } => {
        tracing::error!(saga_error_source = ?source, "Saga error details");
        json!({ "error": "Workflow processing error", "detail": source.to_string() })
      }
      AppError::Internal(m) => json!({ "error": "An internal error occurred", "detail": m }),
    };
    HttpResponse::build(status).json(body)
  }
}

pub type Result<T, E = AppError> = std::result::Result<T, E>;

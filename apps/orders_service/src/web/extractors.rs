// apps/orders_service/src/web/extractors.rs

use crate::errors::AppError;
use crate::services::auth_service::{bearer_token, verify_user_token};
use crate::services::AuthenticatedUser;
use crate::state::AppState;
use actix_web::http::header::AUTHORIZATION;
use actix_web::{web, FromRequest, HttpRequest};
use futures_util::future::{ready, Ready};
use tracing::warn;

/// Resolves the caller from `Authorization: Bearer <jwt>`, verified with
/// the configured `JWT_SECRET`.
impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
    ready(authenticate(req))
  }
}

fn authenticate(req: &HttpRequest) -> Result<AuthenticatedUser, AppError> {
  let state = req.app_data::<web::Data<AppState>>().ok_or_else(|| {
    warn!("AuthenticatedUser extractor: AppState is not registered.");
    AppError::Internal("Application state unavailable".to_string())
  })?;
  let header = req.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok());
  let token = bearer_token(header)?;
  verify_user_token(token, &state.config.jwt_secret)
}

// apps/orders_service/src/services/auth_service.rs

//! Bearer-token verification for inbound requests and short-lived service
//! tokens for calls to downstream services.

use crate::errors::AppError;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

pub const ADMIN_ROLE: &str = "admin";
pub const SERVICE_ROLE: &str = "service";

/// Claims carried by end-user tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
  pub id: String,
  pub email: String,
  pub role: String,
  pub exp: usize,
}

/// The caller of a request, as established from its bearer token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
  pub id: String,
  pub email: String,
  pub role: String,
}

impl AuthenticatedUser {
  pub fn is_admin(&self) -> bool {
    self.role == ADMIN_ROLE
  }
}

impl From<UserClaims> for AuthenticatedUser {
  fn from(claims: UserClaims) -> Self {
    Self {
      id: claims.id,
      email: claims.email,
      role: claims.role,
    }
  }
}

#[instrument(name = "auth_service::verify_user_token", skip_all, err(Display))]
pub fn verify_user_token(token: &str, secret: &str) -> Result<AuthenticatedUser, AppError> {
  let validation = Validation::new(Algorithm::HS256);
  let data = decode::<UserClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation).map_err(|e| {
    debug!(error = %e, "Bearer token rejected.");
    AppError::Auth("Invalid token".to_string())
  })?;
  Ok(data.claims.into())
}

/// Reads `Authorization: Bearer <token>`.
pub fn bearer_token(header_value: Option<&str>) -> Result<&str, AppError> {
  header_value
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .ok_or_else(|| AppError::Auth("Authentication required".to_string()))
}

/// Downstream service a minted token is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceAudience {
  Payment,
  Cart,
}

impl ServiceAudience {
  pub fn as_str(self) -> &'static str {
    match self {
      ServiceAudience::Payment => "payment",
      ServiceAudience::Cart => "cart",
    }
  }
}

/// Carries the same `id`/`email` pair as [`UserClaims`], so downstream
/// services resolve the user exactly as they would from a user token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceClaims {
  /// The user on whose behalf the call is made.
  pub sub: String,
  pub id: String,
  pub email: String,
  pub role: String,
  pub aud: String,
  pub iat: usize,
  pub exp: usize,
}

/// Signs one token per downstream call instead of forwarding the caller's.
pub struct ServiceTokenMinter {
  key: EncodingKey,
  ttl: Duration,
}

impl ServiceTokenMinter {
  pub fn new(secret: &str, ttl: Duration) -> Self {
    Self {
      key: EncodingKey::from_secret(secret.as_bytes()),
      ttl,
    }
  }

  #[instrument(name = "auth_service::mint", skip(self, on_behalf_of), fields(user_id = %on_behalf_of.id, aud = audience.as_str()))]
  pub fn mint(&self, on_behalf_of: &AuthenticatedUser, audience: ServiceAudience) -> Result<String, AppError> {
    let iat = Utc::now().timestamp().max(0) as usize;
    let claims = ServiceClaims {
      sub: on_behalf_of.id.clone(),
      id: on_behalf_of.id.clone(),
      email: on_behalf_of.email.clone(),
      role: SERVICE_ROLE.to_string(),
      aud: audience.as_str().to_string(),
      iat,
      exp: iat + self.ttl.as_secs() as usize,
    };
    encode(&Header::new(Algorithm::HS256), &claims, &self.key).map_err(|e| {
      warn!(error = %e, "Failed to sign service token.");
      AppError::Internal(format!("Could not sign service token: {}", e))
    })
  }
}

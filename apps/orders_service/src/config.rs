// apps/orders_service/src/config.rs

use crate::errors::{AppError, Result};
use dotenvy::dotenv;
use std::env;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
  Pretty,
  Json,
}

impl FromStr for LogFormat {
  type Err = AppError;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "pretty" => Ok(LogFormat::Pretty),
      "json" => Ok(LogFormat::Json),
      other => Err(AppError::Config(format!("Invalid LOG_FORMAT '{}'", other))),
    }
  }
}

#[derive(Clone)]
pub struct AppConfig {
  pub server_host: String,
  pub server_port: u16,
  /// `None` keeps orders and intents in memory.
  pub database_url: Option<String>,
  pub jwt_secret: String,
  pub service_token_secret: String,
  pub service_token_ttl: Duration,

  pub payment_service_url: String,
  pub cart_service_url: String,
  pub notifications_service_url: String,
  pub downstream_timeout: Duration,
  /// Use the in-process payment/cart/notifier instead of HTTP clients.
  pub mock_downstream: bool,

  /// Zero disables the background recovery sweep.
  pub recovery_sweep_interval: Duration,
  pub recovery_stale_after: Duration,

  pub log_format: LogFormat,
}

impl std::fmt::Debug for AppConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("AppConfig")
      .field("server_host", &self.server_host)
      .field("server_port", &self.server_port)
      .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
      .field("payment_service_url", &self.payment_service_url)
      .field("cart_service_url", &self.cart_service_url)
      .field("notifications_service_url", &self.notifications_service_url)
      .field("downstream_timeout", &self.downstream_timeout)
      .field("mock_downstream", &self.mock_downstream)
      .field("recovery_sweep_interval", &self.recovery_sweep_interval)
      .field("recovery_stale_after", &self.recovery_stale_after)
      .field("log_format", &self.log_format)
      .finish_non_exhaustive()
  }
}

fn parse_var<T>(name: &str, raw: Option<String>, default: T) -> Result<T>
where
  T: FromStr,
  T::Err: std::fmt::Display,
{
  match raw {
    None => Ok(default),
    Some(value) => value
      .trim()
      .parse::<T>()
      .map_err(|e| AppError::Config(format!("Invalid {} value '{}': {}", name, value, e))),
  }
}

impl AppConfig {
  pub fn from_env() -> Result<Self> {
    dotenv().ok(); // Load .env file if present
    Self::from_lookup(|name| env::var(name).ok().filter(|v| !v.is_empty()))
  }

  /// Builds the config from an arbitrary variable source.
  pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
    let server_host = lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
    let server_port = parse_var("SERVER_PORT", lookup("SERVER_PORT"), 3004u16)?;
    let database_url = lookup("DATABASE_URL");

    let jwt_secret = lookup("JWT_SECRET")
      .ok_or_else(|| AppError::Config("Missing environment variable 'JWT_SECRET'".to_string()))?;
    let service_token_secret = lookup("SERVICE_TOKEN_SECRET").unwrap_or_else(|| jwt_secret.clone());
    let service_token_ttl = Duration::from_secs(parse_var("SERVICE_TOKEN_TTL_SECS", lookup("SERVICE_TOKEN_TTL_SECS"), 60u64)?);
    if service_token_ttl.is_zero() {
      return Err(AppError::Config("SERVICE_TOKEN_TTL_SECS must be positive".to_string()));
    }

    let payment_service_url = trim_url(lookup("PAYMENT_SERVICE_URL").unwrap_or_else(|| "http://payment-service:3005".to_string()));
    let cart_service_url = trim_url(lookup("CART_SERVICE_URL").unwrap_or_else(|| "http://cart-service:3003".to_string()));
    let notifications_service_url = trim_url(
      lookup("NOTIFICATIONS_SERVICE_URL").unwrap_or_else(|| "http://notifications-service:3006".to_string()),
    );
    let downstream_timeout = Duration::from_secs(parse_var(
      "DOWNSTREAM_TIMEOUT_SECS",
      lookup("DOWNSTREAM_TIMEOUT_SECS"),
      10u64,
    )?);
    let mock_downstream = parse_var("MOCK_DOWNSTREAM", lookup("MOCK_DOWNSTREAM"), false)?;

    let recovery_sweep_interval = Duration::from_secs(parse_var(
      "RECOVERY_SWEEP_INTERVAL_SECS",
      lookup("RECOVERY_SWEEP_INTERVAL_SECS"),
      60u64,
    )?);
    let recovery_stale_after = Duration::from_secs(parse_var(
      "RECOVERY_STALE_AFTER_SECS",
      lookup("RECOVERY_STALE_AFTER_SECS"),
      300u64,
    )?);

    let log_format = parse_var("LOG_FORMAT", lookup("LOG_FORMAT"), LogFormat::Pretty)?;

    Ok(Self {
      server_host,
      server_port,
      database_url,
      jwt_secret,
      service_token_secret,
      service_token_ttl,
      payment_service_url,
      cart_service_url,
      notifications_service_url,
      downstream_timeout,
      mock_downstream,
      recovery_sweep_interval,
      recovery_stale_after,
      log_format,
    })
  }
}

fn trim_url(url: String) -> String {
  url.trim_end_matches('/').to_string()
}

// apps/orders_service/src/services/notifier.rs

//! Templated email requests to the notifications service. Callers treat
//! every failure here as non-fatal.

use crate::errors::{AppError, Result as AppResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, instrument};

const SERVICE: &str = "notifications";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EmailNotification {
  pub to: String,
  pub subject: String,
  pub template_name: String,
  pub data: Value,
}

#[async_trait]
pub trait Notifier: Send + Sync {
  async fn send_email(&self, email: &EmailNotification) -> AppResult<()>;
}

/// `POST {base_url}/email`. Sent without credentials.
pub struct HttpNotifier {
  client: reqwest::Client,
  base_url: String,
}

impl HttpNotifier {
  pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
    Self {
      client,
      base_url: base_url.into(),
    }
  }
}

#[async_trait]
impl Notifier for HttpNotifier {
  #[instrument(name = "notifier::send_email", skip(self, email), fields(template = %email.template_name))]
  async fn send_email(&self, email: &EmailNotification) -> AppResult<()> {
    self
      .client
      .post(format!("{}/email", self.base_url))
      .json(email)
      .send()
      .await
      .map_err(|e| AppError::downstream(SERVICE, e))?
      .error_for_status()
      .map_err(|e| AppError::downstream(SERVICE, e))?;
    Ok(())
  }
}

/// Logs each email instead of sending it and counts what went out.
#[derive(Debug, Default)]
pub struct MockNotifier {
  sent: AtomicUsize,
}

impl MockNotifier {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn sent_count(&self) -> usize {
    self.sent.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl Notifier for MockNotifier {
  async fn send_email(&self, email: &EmailNotification) -> AppResult<()> {
    info!(to = %email.to, subject = %email.subject, template = %email.template_name, "Simulating email send.");
    self.sent.fetch_add(1, Ordering::SeqCst);
    Ok(())
  }
}

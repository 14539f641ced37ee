// apps/orders_service/src/services/payment.rs

//! The payment authority: turns an amount and a payment method into a
//! settlement outcome.

use crate::errors::{AppError, Result as AppResult};
use crate::models::{Money, PaymentStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, instrument};
use uuid::Uuid;

const SERVICE: &str = "payment";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
  pub order_id: Uuid,
  pub amount: Money,
  pub payment_method: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementStatus {
  Completed,
  Failed,
}

impl From<SettlementStatus> for PaymentStatus {
  fn from(status: SettlementStatus) -> Self {
    match status {
      SettlementStatus::Completed => PaymentStatus::Completed,
      SettlementStatus::Failed => PaymentStatus::Failed,
    }
  }
}

/// What the payment authority answered. Stored verbatim in the intent
/// journal so a recovery run can apply it without charging again.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentReceipt {
  pub transaction_id: String,
  pub status: SettlementStatus,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub amount: Option<Money>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub payment_method: Option<String>,
}

impl PaymentReceipt {
  pub fn is_completed(&self) -> bool {
    self.status == SettlementStatus::Completed
  }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  /// Requests settlement. A declined payment is an `Ok` receipt with status
  /// `failed`; `Err` means no usable answer was obtained.
  async fn process(&self, request: &PaymentRequest, service_token: &str) -> AppResult<PaymentReceipt>;
}

/// `POST {base_url}/process` on the payment service.
pub struct HttpPaymentGateway {
  client: reqwest::Client,
  base_url: String,
}

impl HttpPaymentGateway {
  pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
    Self {
      client,
      base_url: base_url.into(),
    }
  }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
  #[instrument(name = "payment::process", skip(self, service_token), fields(order_id = %request.order_id, amount = %request.amount))]
  async fn process(&self, request: &PaymentRequest, service_token: &str) -> AppResult<PaymentReceipt> {
    let response = self
      .client
      .post(format!("{}/process", self.base_url))
      .bearer_auth(service_token)
      .json(request)
      .send()
      .await
      .map_err(|e| AppError::downstream(SERVICE, e))?
      .error_for_status()
      .map_err(|e| AppError::downstream(SERVICE, e))?;

    let receipt = response
      .json::<PaymentReceipt>()
      .await
      .map_err(|e| AppError::downstream(SERVICE, format!("undecodable settlement: {}", e)))?;
    info!(transaction_id = %receipt.transaction_id, status = ?receipt.status, "Settlement received.");
    Ok(receipt)
  }
}

/// In-process payment authority. Declines any amount whose cent value ends
/// in `123` per thousand, approves everything else.
#[derive(Debug, Default)]
pub struct MockPaymentGateway {
  calls: AtomicUsize,
}

impl MockPaymentGateway {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(name = "payment::mock_process", skip(self, _service_token), fields(order_id = %request.order_id, amount = %request.amount))]
  async fn process(&self, request: &PaymentRequest, _service_token: &str) -> AppResult<PaymentReceipt> {
    self.calls.fetch_add(1, Ordering::SeqCst);

    let status = if request.amount.cents() % 1000 == 123 {
      info!("Mock payment FAILED due to test condition.");
      SettlementStatus::Failed
    } else {
      SettlementStatus::Completed
    };
    Ok(PaymentReceipt {
      transaction_id: format!("txn_{}", Uuid::new_v4().simple()),
      status,
      amount: Some(request.amount),
      payment_method: Some(request.payment_method.clone()),
    })
  }
}

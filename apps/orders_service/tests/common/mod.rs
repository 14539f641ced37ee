// tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use checkout_saga::{InMemoryJournal, IntentJournal};
use chrono::Utc;
use jsonwebtoken::{encode, EncodingKey, Header};
use once_cell::sync::Lazy;
use orders_service::config::AppConfig;
use orders_service::db::{InMemoryOrderRepository, OrderRepository};
use orders_service::errors::{AppError, Result as AppResult};
use orders_service::models::{Money, Order, OrderStatus};
use orders_service::services::auth_service::UserClaims;
use orders_service::services::{
  AuthenticatedUser, CartService, EmailNotification, Notifier, PaymentGateway, PaymentReceipt, PaymentRequest,
  SettlementStatus,
};
use orders_service::state::{AppState, Collaborators};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::Level;

pub const JWT_SECRET: &str = "integration-test-secret";

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING);
}

pub fn test_config() -> AppConfig {
  AppConfig::from_lookup(|name| match name {
    "JWT_SECRET" => Some(JWT_SECRET.to_string()),
    "RECOVERY_SWEEP_INTERVAL_SECS" => Some("0".to_string()),
    _ => None,
  })
  .expect("test config")
}

pub fn user_token(user_id: &str, role: &str) -> String {
  let claims = UserClaims {
    id: user_id.to_string(),
    email: format!("{}@example.com", user_id),
    role: role.to_string(),
    exp: (Utc::now().timestamp() + 3600) as usize,
  };
  encode(&Header::default(), &claims, &EncodingKey::from_secret(JWT_SECRET.as_bytes())).expect("sign test token")
}

pub fn customer(user_id: &str) -> AuthenticatedUser {
  AuthenticatedUser {
    id: user_id.to_string(),
    email: format!("{}@example.com", user_id),
    role: "user".to_string(),
  }
}

/// Two items totalling $45.00, paid by credit card.
pub fn checkout_body() -> Value {
  json!({
    "items": [
      { "productId": "p-1", "name": "Mug", "price": 15.0, "quantity": 2 },
      { "productId": "p-2", "name": "Tea", "price": 15.0, "quantity": 1 }
    ],
    "totalAmount": 45.0,
    "shippingAddress": {
      "street": "1 Main St",
      "city": "Springfield",
      "state": "IL",
      "zipCode": "62701",
      "country": "US"
    },
    "paymentInfo": { "method": "credit_card" }
  })
}

// --- Scripted collaborators ---

#[derive(Clone, Debug)]
pub enum PaymentScript {
  Settle(SettlementStatus, &'static str),
  Unreachable,
}

pub struct ScriptedPayment {
  script: Mutex<PaymentScript>,
  pub requests: Mutex<Vec<PaymentRequest>>,
  pub tokens: Mutex<Vec<String>>,
}

impl ScriptedPayment {
  pub fn new(script: PaymentScript) -> Arc<Self> {
    Arc::new(Self {
      script: Mutex::new(script),
      requests: Mutex::new(Vec::new()),
      tokens: Mutex::new(Vec::new()),
    })
  }

  pub fn completing(transaction_id: &'static str) -> Arc<Self> {
    Self::new(PaymentScript::Settle(SettlementStatus::Completed, transaction_id))
  }

  pub fn set_script(&self, script: PaymentScript) {
    *self.script.lock() = script;
  }

  pub fn calls(&self) -> usize {
    self.requests.lock().len()
  }
}

#[async_trait]
impl PaymentGateway for ScriptedPayment {
  async fn process(&self, request: &PaymentRequest, service_token: &str) -> AppResult<PaymentReceipt> {
    self.requests.lock().push(request.clone());
    self.tokens.lock().push(service_token.to_string());
    let script = self.script.lock().clone();
    match script {
      PaymentScript::Settle(status, transaction_id) => Ok(PaymentReceipt {
        transaction_id: transaction_id.to_string(),
        status,
        amount: Some(request.amount),
        payment_method: Some(request.payment_method.clone()),
      }),
      PaymentScript::Unreachable => Err(AppError::downstream("payment", "connection refused")),
    }
  }
}

#[derive(Default)]
pub struct RecordingCart {
  pub fail: bool,
  pub cleared_for: Mutex<Vec<String>>,
}

impl RecordingCart {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn failing() -> Arc<Self> {
    Arc::new(Self {
      fail: true,
      ..Self::default()
    })
  }

  pub fn calls(&self) -> usize {
    self.cleared_for.lock().len()
  }
}

#[async_trait]
impl CartService for RecordingCart {
  async fn clear_cart(&self, user_id: &str, _service_token: &str) -> AppResult<()> {
    self.cleared_for.lock().push(user_id.to_string());
    if self.fail {
      return Err(AppError::downstream("cart", "503 Service Unavailable"));
    }
    Ok(())
  }
}

#[derive(Default)]
pub struct RecordingNotifier {
  pub fail: bool,
  pub sent: Mutex<Vec<EmailNotification>>,
}

impl RecordingNotifier {
  pub fn new() -> Arc<Self> {
    Arc::new(Self::default())
  }

  pub fn failing() -> Arc<Self> {
    Arc::new(Self {
      fail: true,
      ..Self::default()
    })
  }

  pub fn templates(&self) -> Vec<String> {
    self.sent.lock().iter().map(|e| e.template_name.clone()).collect()
  }
}

#[async_trait]
impl Notifier for RecordingNotifier {
  async fn send_email(&self, email: &EmailNotification) -> AppResult<()> {
    self.sent.lock().push(email.clone());
    if self.fail {
      return Err(AppError::downstream("notifications", "timed out"));
    }
    Ok(())
  }
}

/// Order store whose inserts always fail.
#[derive(Default)]
pub struct BrokenOrderStore;

#[async_trait]
impl OrderRepository for BrokenOrderStore {
  async fn insert(&self, _order: &Order) -> AppResult<()> {
    Err(AppError::Persistence("disk full".to_string()))
  }
  async fn save(&self, _order: &Order, _expected: OrderStatus) -> AppResult<()> {
    Err(AppError::Persistence("disk full".to_string()))
  }
  async fn find_by_id(&self, _id: uuid::Uuid) -> AppResult<Option<Order>> {
    Ok(None)
  }
  async fn find_for_user(&self, _id: uuid::Uuid, _user_id: &str) -> AppResult<Option<Order>> {
    Ok(None)
  }
  async fn list_for_user(&self, _user_id: &str) -> AppResult<Vec<Order>> {
    Ok(Vec::new())
  }
  async fn list_unsettled(&self, _created_before: chrono::DateTime<Utc>) -> AppResult<Vec<Order>> {
    Ok(Vec::new())
  }
}

/// Accepts new orders but fails every later update.
#[derive(Default)]
pub struct UnsaveableOrderStore {
  pub inner: InMemoryOrderRepository,
  pub save_attempts: Mutex<usize>,
}

#[async_trait]
impl OrderRepository for UnsaveableOrderStore {
  async fn insert(&self, order: &Order) -> AppResult<()> {
    self.inner.insert(order).await
  }
  async fn save(&self, _order: &Order, _expected: OrderStatus) -> AppResult<()> {
    *self.save_attempts.lock() += 1;
    Err(AppError::Persistence("connection reset".to_string()))
  }
  async fn find_by_id(&self, id: uuid::Uuid) -> AppResult<Option<Order>> {
    self.inner.find_by_id(id).await
  }
  async fn find_for_user(&self, id: uuid::Uuid, user_id: &str) -> AppResult<Option<Order>> {
    self.inner.find_for_user(id, user_id).await
  }
  async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>> {
    self.inner.list_for_user(user_id).await
  }
  async fn list_unsettled(&self, created_before: chrono::DateTime<Utc>) -> AppResult<Vec<Order>> {
    self.inner.list_unsettled(created_before).await
  }
}

/// In-memory store where another writer moves an order to `interleaved`
/// right after the next `find_by_id` hands it out.
#[derive(Default)]
pub struct InterleavedOrderStore {
  pub inner: InMemoryOrderRepository,
  interleaved: Mutex<Option<OrderStatus>>,
}

impl InterleavedOrderStore {
  pub fn change_after_next_load(&self, status: OrderStatus) {
    *self.interleaved.lock() = Some(status);
  }
}

#[async_trait]
impl OrderRepository for InterleavedOrderStore {
  async fn insert(&self, order: &Order) -> AppResult<()> {
    self.inner.insert(order).await
  }
  async fn save(&self, order: &Order, expected: OrderStatus) -> AppResult<()> {
    self.inner.save(order, expected).await
  }
  async fn find_by_id(&self, id: uuid::Uuid) -> AppResult<Option<Order>> {
    let found = self.inner.find_by_id(id).await?;
    let interleaved = self.interleaved.lock().take();
    if let (Some(status), Some(order)) = (interleaved, found.clone()) {
      let mut other = order;
      let loaded = other.status;
      other.status = status;
      self.inner.save(&other, loaded).await?;
    }
    Ok(found)
  }
  async fn find_for_user(&self, id: uuid::Uuid, user_id: &str) -> AppResult<Option<Order>> {
    self.inner.find_for_user(id, user_id).await
  }
  async fn list_for_user(&self, user_id: &str) -> AppResult<Vec<Order>> {
    self.inner.list_for_user(user_id).await
  }
  async fn list_unsettled(&self, created_before: chrono::DateTime<Utc>) -> AppResult<Vec<Order>> {
    self.inner.list_unsettled(created_before).await
  }
}

/// App state over a caller-chosen order store.
pub fn state_with_orders(
  orders: Arc<dyn OrderRepository>,
  payments: Arc<ScriptedPayment>,
  carts: Arc<RecordingCart>,
  notifier: Arc<RecordingNotifier>,
) -> AppState {
  setup_tracing();
  AppState::new(
    Arc::new(test_config()),
    orders,
    Arc::new(InMemoryJournal::new()),
    Collaborators {
      payments,
      carts,
      notifier,
    },
  )
}

pub struct Harness {
  pub state: AppState,
  pub orders: Arc<InMemoryOrderRepository>,
  pub journal: Arc<InMemoryJournal>,
  pub payments: Arc<ScriptedPayment>,
  pub carts: Arc<RecordingCart>,
  pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
  pub fn new(payments: Arc<ScriptedPayment>, carts: Arc<RecordingCart>, notifier: Arc<RecordingNotifier>) -> Self {
    setup_tracing();
    let orders = Arc::new(InMemoryOrderRepository::new());
    let journal = Arc::new(InMemoryJournal::new());
    let state = AppState::new(
      Arc::new(test_config()),
      orders.clone(),
      journal.clone() as Arc<dyn IntentJournal>,
      Collaborators {
        payments: payments.clone(),
        carts: carts.clone(),
        notifier: notifier.clone(),
      },
    );
    Self {
      state,
      orders,
      journal,
      payments,
      carts,
      notifier,
    }
  }

  /// Happy-path collaborators: payment completes with `txn_abc`.
  pub fn happy() -> Self {
    Self::new(ScriptedPayment::completing("txn_abc"), RecordingCart::new(), RecordingNotifier::new())
  }

  /// Stores an order directly, bypassing checkout.
  pub async fn seed_order(&self, order: &Order) {
    self.orders.insert(order).await.expect("seed order");
  }
}

pub fn dollars(amount: f64) -> Money {
  Money::from_major(amount).expect("finite amount")
}

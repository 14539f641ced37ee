// apps/orders_service/src/state.rs
use crate::config::AppConfig;
use crate::db::{self, InMemoryOrderRepository, OrderRepository, PgIntentJournal, PgOrderRepository};
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::OrderSagas;
use crate::services::{
  CartService, HttpCartService, HttpNotifier, HttpPaymentGateway, InMemoryCartBook, MockNotifier, MockPaymentGateway,
  Notifier, PaymentGateway, ServiceTokenMinter,
};
use checkout_saga::{InMemoryJournal, IntentJournal};
use std::sync::Arc;
use tracing::{info, warn};

/// The downstream services checkout talks to.
#[derive(Clone)]
pub struct Collaborators {
  pub payments: Arc<dyn PaymentGateway>,
  pub carts: Arc<dyn CartService>,
  pub notifier: Arc<dyn Notifier>,
}

impl Collaborators {
  /// In-process stand-ins for all three services.
  pub fn mocked() -> Self {
    Self {
      payments: Arc::new(MockPaymentGateway::new()),
      carts: Arc::new(InMemoryCartBook::new()),
      notifier: Arc::new(MockNotifier::new()),
    }
  }

  pub fn http(config: &AppConfig) -> AppResult<Self> {
    let client = reqwest::Client::builder()
      .timeout(config.downstream_timeout)
      .build()
      .map_err(|e| AppError::Config(format!("Could not build HTTP client: {}", e)))?;
    Ok(Self {
      payments: Arc::new(HttpPaymentGateway::new(client.clone(), config.payment_service_url.clone())),
      carts: Arc::new(HttpCartService::new(client.clone(), config.cart_service_url.clone())),
      notifier: Arc::new(HttpNotifier::new(client, config.notifications_service_url.clone())),
    })
  }
}

#[derive(Clone)]
pub struct AppState {
  pub config: Arc<AppConfig>, // Share loaded config
  pub orders: Arc<dyn OrderRepository>,
  pub journal: Arc<dyn IntentJournal>,
  pub payments: Arc<dyn PaymentGateway>,
  pub carts: Arc<dyn CartService>,
  pub notifier: Arc<dyn Notifier>,
  pub tokens: Arc<ServiceTokenMinter>,
  pub sagas: Arc<OrderSagas>,
}

impl AppState {
  pub fn new(
    config: Arc<AppConfig>,
    orders: Arc<dyn OrderRepository>,
    journal: Arc<dyn IntentJournal>,
    collaborators: Collaborators,
  ) -> Self {
    let tokens = Arc::new(ServiceTokenMinter::new(
      &config.service_token_secret,
      config.service_token_ttl,
    ));
    let sagas = Arc::new(OrderSagas::new(journal.clone()));
    Self {
      config,
      orders,
      journal,
      payments: collaborators.payments,
      carts: collaborators.carts,
      notifier: collaborators.notifier,
      tokens,
      sagas,
    }
  }

  /// Wires storage and collaborators as the config dictates: Postgres when
  /// `DATABASE_URL` is set, HTTP clients unless `MOCK_DOWNSTREAM` is on.
  pub async fn from_config(config: Arc<AppConfig>) -> AppResult<Self> {
    let (orders, journal): (Arc<dyn OrderRepository>, Arc<dyn IntentJournal>) = match &config.database_url {
      Some(url) => {
        let pool = db::connect(url).await?;
        (
          Arc::new(PgOrderRepository::new(pool.clone())),
          Arc::new(PgIntentJournal::new(pool)),
        )
      }
      None => {
        warn!("DATABASE_URL not set; orders and intents are kept in memory and lost on restart.");
        (Arc::new(InMemoryOrderRepository::new()), Arc::new(InMemoryJournal::new()))
      }
    };

    let collaborators = if config.mock_downstream {
      info!("MOCK_DOWNSTREAM enabled; using in-process payment, cart and notification services.");
      Collaborators::mocked()
    } else {
      Collaborators::http(&config)?
    };

    Ok(Self::new(config, orders, journal, collaborators))
  }
}

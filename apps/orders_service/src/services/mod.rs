// apps/orders_service/src/services/mod.rs

//! Downstream collaborators and credential handling.

pub mod auth_service;
pub mod cart;
pub mod notifier;
pub mod payment;

pub use auth_service::{AuthenticatedUser, ServiceAudience, ServiceTokenMinter};
pub use cart::{CartService, HttpCartService, InMemoryCartBook};
pub use notifier::{EmailNotification, HttpNotifier, MockNotifier, Notifier};
pub use payment::{HttpPaymentGateway, MockPaymentGateway, PaymentGateway, PaymentReceipt, PaymentRequest, SettlementStatus};

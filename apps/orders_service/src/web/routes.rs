// apps/orders_service/src/web/routes.rs

use crate::errors::AppError;
use crate::web::handlers::order_handlers;
use actix_web::web;

async fn health_check_handler() -> actix_web::HttpResponse {
  actix_web::HttpResponse::Ok().json(serde_json::json!({ "status": "OK" }))
}

/// Malformed JSON bodies answer like any other validation failure.
fn json_config() -> web::JsonConfig {
  web::JsonConfig::default().error_handler(|err, _req| AppError::Validation(err.to_string()).into())
}

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg
    .app_data(json_config())
    .route("/health", web::get().to(health_check_handler))
    .service(
      web::scope("/orders")
        .route("", web::post().to(order_handlers::create_order_handler))
        .route("", web::get().to(order_handlers::list_orders_handler))
        .route("/{order_id}", web::get().to(order_handlers::get_order_handler))
        .route("/{order_id}/status", web::put().to(order_handlers::update_order_status_handler))
        .route("/{order_id}/cancel", web::put().to(order_handlers::cancel_order_handler)),
    );
}

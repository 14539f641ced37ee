// apps/orders_service/src/web/handlers/mod.rs

pub mod order_handlers;

// apps/orders_service/src/lib.rs

//! Order checkout and lifecycle service.

pub mod config;
pub mod db;
pub mod errors;
pub mod models;
pub mod pipelines;
pub mod services;
pub mod state;
pub mod web;

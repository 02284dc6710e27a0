//! Library Management System
//!
//! REST JSON API for a small library: catalog management, patron accounts
//! with session tokens, and a checkout/return ledger that keeps book
//! availability consistent under concurrent requests.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub services: Arc<services::Services>,
}

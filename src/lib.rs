//! Library catalog server
//!
//! Users with roles and permissions, authors, books, libraries and their
//! librarians, served as role-gated site pages, a JSON API and an admin
//! interface over every model.

use std::sync::Arc;

pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire repository and services over an open pool
    pub fn new(config: AppConfig, pool: sqlx::SqlitePool) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(repository, &config);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

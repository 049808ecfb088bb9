//! Application state - Dependency injection container.
//!
//! Provides centralized access to all application services and infrastructure.

use std::sync::Arc;

use crate::config::Config;
use crate::infra::Database;
use crate::services::{AuthService, BidService, PaymentService, ServiceContainer, Services};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<dyn AuthService>,
    pub bid_service: Arc<dyn BidService>,
    pub payment_service: Arc<dyn PaymentService>,
    /// Database handle, used for health checks
    pub database: Arc<Database>,
}

impl AppState {
    /// Build every service on the database's connection pool.
    pub fn from_config(database: Arc<Database>, config: &Config) -> Self {
        let services = Services::from_connection(database.get_connection(), config);
        Self::from_services(&services, database)
    }

    pub fn from_services(services: &dyn ServiceContainer, database: Arc<Database>) -> Self {
        Self {
            auth_service: services.auth(),
            bid_service: services.bids(),
            payment_service: services.payments(),
            database,
        }
    }

    /// Create application state with manually injected services.
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        bid_service: Arc<dyn BidService>,
        payment_service: Arc<dyn PaymentService>,
        database: Arc<Database>,
    ) -> Self {
        Self {
            auth_service,
            bid_service,
            payment_service,
            database,
        }
    }
}

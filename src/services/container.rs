//! Service Container - Centralized service access.
//!
//! SOLID (SRP): Manages service lifecycle and access.
//! SOLID (DIP): Depends on service traits, not implementations.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::{
    AuthService, Authenticator, BidManager, BidService, PaymentProcessor, PaymentService,
};
use crate::config::Config;
use crate::infra::VnPayClient;

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    fn auth(&self) -> Arc<dyn AuthService>;

    fn bids(&self) -> Arc<dyn BidService>;

    fn payments(&self) -> Arc<dyn PaymentService>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    bid_service: Arc<dyn BidService>,
    payment_service: Arc<dyn PaymentService>,
}

impl Services {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        bid_service: Arc<dyn BidService>,
        payment_service: Arc<dyn PaymentService>,
    ) -> Self {
        Self {
            auth_service,
            bid_service,
            payment_service,
        }
    }

    /// Wire every service to one connection pool
    pub fn from_connection(db: DatabaseConnection, config: &Config) -> Self {
        Self {
            auth_service: Arc::new(Authenticator::new(db.clone(), config.jwt.clone())),
            bid_service: Arc::new(BidManager::new(db.clone())),
            payment_service: Arc::new(PaymentProcessor::new(
                db,
                VnPayClient::new(config.vnpay.clone()),
            )),
        }
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        Arc::clone(&self.auth_service)
    }

    fn bids(&self) -> Arc<dyn BidService> {
        Arc::clone(&self.bid_service)
    }

    fn payments(&self) -> Arc<dyn PaymentService> {
        Arc::clone(&self.payment_service)
    }
}

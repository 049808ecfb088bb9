//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. Each call opens its own Unit of Work.

mod auth_service;
mod bid_service;
pub mod container;
mod payment_service;

use sea_orm::{Condition, EntityTrait};

use crate::errors::{AppError, AppResult};
use crate::infra::repositories::query::resolve_column;
use crate::infra::QuerySpec;
use crate::types::ListQuery;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator, Claims};
pub use bid_service::{BidFilter, BidManager, BidService};
pub use payment_service::{PaymentProcessor, PaymentService};

#[cfg(any(test, feature = "test-utils"))]
pub use auth_service::MockAuthService;

/// Query spec for a list endpoint. Order fields come from the client, so
/// an unknown one is a bad request rather than a contract violation.
pub(crate) fn list_spec<E: EntityTrait>(query: &ListQuery, predicate: Condition) -> AppResult<QuerySpec> {
    if let Some(field) = query.order_by.as_deref() {
        resolve_column::<E>(field)
            .map_err(|_| AppError::bad_request(format!("Cannot order by '{}'", field)))?;
    }

    Ok(QuerySpec {
        predicate: Some(predicate),
        order_by: query.order_by.clone(),
        is_ascending: query.is_ascending,
        includes: Vec::new(),
        page_index: query.page_index,
        page_size: query.limit(),
    })
}

//! Account roles and the account/token payloads returned to clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{ROLE_ADMIN, ROLE_CUSTOMER, ROLE_STAFF};

/// Account roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Staff,
    Customer,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    /// Admins pass every role check; everyone else only their own.
    pub fn can_access(&self, required: Role) -> bool {
        self.is_admin() || *self == required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ROLE_ADMIN,
            Role::Staff => ROLE_STAFF,
            Role::Customer => ROLE_CUSTOMER,
        }
    }
}

impl From<&str> for Role {
    /// Unknown values fall back to the least privileged role.
    fn from(s: &str) -> Self {
        match s {
            ROLE_ADMIN => Role::Admin,
            ROLE_STAFF => Role::Staff,
            _ => Role::Customer,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account details safe to return to the client
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AccountResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "abc@gmail.com")]
    pub email: String,
    #[schema(example = "abc")]
    pub user_name: String,
    #[schema(example = "customer")]
    pub role: Role,
    /// Wallet balance in VND
    #[schema(example = 1500000)]
    pub wallet_balance: i64,
    pub created_at: DateTime<Utc>,
}

/// Access token + refresh token
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenPair {
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub access_token: String,
    #[schema(example = "6f1d0c1b8e0f4c6e9a7d...")]
    pub refresh_token: String,
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Access token lifetime in seconds
    #[schema(example = 1800)]
    pub expires_in: i64,
}

/// Result of a successful login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub account_id: Uuid,
    #[schema(example = "abc@gmail.com")]
    pub email: String,
    #[schema(example = "customer")]
    pub role: Role,
    pub tokens: TokenPair,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_strings() {
        for role in [Role::Admin, Role::Staff, Role::Customer] {
            assert_eq!(Role::from(role.as_str()), role);
        }
        assert_eq!(Role::from("superuser"), Role::Customer);
    }

    #[test]
    fn admin_passes_every_role_check() {
        assert!(Role::Admin.can_access(Role::Customer));
        assert!(Role::Admin.can_access(Role::Staff));
        assert!(Role::Customer.can_access(Role::Customer));
        assert!(!Role::Customer.can_access(Role::Staff));
        assert!(!Role::Staff.can_access(Role::Admin));
    }
}

//! Shared fixtures: a migrated in-memory SQLite database and row builders.

#![allow(dead_code)]

use chrono::Utc;
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use uuid::Uuid;

use diamond_shop::domain::{BidStatus, OrderStatus};
use diamond_shop::infra::repositories::entities::{account, bid, order};
use diamond_shop::infra::Migrator;

/// Fresh schema per test. One pooled connection, otherwise every
/// connection would open its own empty in-memory database.
pub async fn setup_db() -> DatabaseConnection {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .expect("in-memory sqlite should open");
    Migrator::up(&db, None)
        .await
        .expect("migrations should apply");
    db
}

pub fn account(email: &str) -> account::Model {
    let now = Utc::now();
    account::Model {
        id: Uuid::new_v4(),
        email: email.to_string(),
        user_name: email.split('@').next().unwrap_or(email).to_string(),
        password_hash: "not-a-real-hash".to_string(),
        role: "customer".to_string(),
        wallet_balance: 0,
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn bid(account_id: Uuid, diamond_code: &str, amount: i64) -> bid::Model {
    let now = Utc::now();
    bid::Model {
        id: Uuid::new_v4(),
        account_id,
        diamond_code: diamond_code.to_string(),
        amount,
        status: BidStatus::Active.as_str().to_string(),
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

pub fn order(account_id: Uuid, total_amount: i64) -> order::Model {
    let now = Utc::now();
    order::Model {
        id: Uuid::new_v4(),
        account_id,
        total_amount,
        status: OrderStatus::Pending.as_str().to_string(),
        is_deleted: false,
        created_at: now,
        updated_at: now,
    }
}

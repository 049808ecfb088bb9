//! Unit of Work.
//!
//! Bundles every repository around one shared [`DbContext`], so writes
//! staged through any of them are committed together by
//! [`UnitOfWork::save_changes`]. Create one per request.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

use super::context::DbContext;
use super::repositories::{
    AccountRepository, AccountTokenRepository, BidRepository, OrderRepository,
    TransactionRepository,
};
use crate::errors::AppResult;

pub struct UnitOfWork {
    context: Arc<DbContext>,
    accounts: AccountRepository,
    account_tokens: AccountTokenRepository,
    bids: BidRepository,
    orders: OrderRepository,
    transactions: TransactionRepository,
}

impl UnitOfWork {
    pub fn new(db: DatabaseConnection) -> Self {
        let context = Arc::new(DbContext::new(db));
        Self {
            accounts: AccountRepository::new(Arc::clone(&context)),
            account_tokens: AccountTokenRepository::new(Arc::clone(&context)),
            bids: BidRepository::new(Arc::clone(&context)),
            orders: OrderRepository::new(Arc::clone(&context)),
            transactions: TransactionRepository::new(Arc::clone(&context)),
            context,
        }
    }

    pub fn accounts(&self) -> &AccountRepository {
        &self.accounts
    }

    pub fn account_tokens(&self) -> &AccountTokenRepository {
        &self.account_tokens
    }

    pub fn bids(&self) -> &BidRepository {
        &self.bids
    }

    pub fn orders(&self) -> &OrderRepository {
        &self.orders
    }

    pub fn transactions(&self) -> &TransactionRepository {
        &self.transactions
    }

    pub fn db(&self) -> &DatabaseConnection {
        self.context.connection()
    }

    /// Commit everything staged through any repository in one transaction.
    pub async fn save_changes(&self) -> AppResult<usize> {
        self.context.save_changes().await
    }

    pub async fn discard_changes(&self) -> usize {
        self.context.discard_changes().await
    }
}

//! Bid service - placing, listing and withdrawing bids on diamonds.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, QueryOrder};
use uuid::Uuid;

use super::list_spec;
use crate::domain::{BidResponse, BidStatus, Role};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::entities::bid;
use crate::infra::UnitOfWork;
use crate::types::{ListQuery, Paginated};

/// Filters accepted by [`BidService::list`]
#[derive(Debug, Clone, Default)]
pub struct BidFilter {
    pub diamond_code: Option<String>,
    pub account_id: Option<Uuid>,
}

#[async_trait]
pub trait BidService: Send + Sync {
    /// Live bids, paged and ordered by a named field
    async fn list(&self, filter: BidFilter, query: ListQuery) -> AppResult<Paginated<BidResponse>>;

    async fn get(&self, id: Uuid) -> AppResult<BidResponse>;

    /// Bid on a diamond; must beat the current highest active bid
    async fn place(&self, account_id: Uuid, diamond_code: String, amount: i64)
        -> AppResult<BidResponse>;

    /// Withdraw a bid. Owner or admin only.
    async fn withdraw(&self, id: Uuid, caller_id: Uuid, caller_role: Role) -> AppResult<()>;
}

pub struct BidManager {
    db: DatabaseConnection,
}

impl BidManager {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone())
    }

    async fn live_bid(uow: &UnitOfWork, id: Uuid) -> AppResult<bid::Model> {
        uow.bids()
            .get_by_id(id, &[])
            .await?
            .filter(|bid| !bid.is_deleted)
            .ok_or_not_found()
    }
}

#[async_trait]
impl BidService for BidManager {
    async fn list(&self, filter: BidFilter, query: ListQuery) -> AppResult<Paginated<BidResponse>> {
        let mut predicate = Condition::all().add(bid::Column::IsDeleted.eq(false));
        if let Some(code) = filter.diamond_code {
            predicate = predicate.add(bid::Column::DiamondCode.eq(code));
        }
        if let Some(account_id) = filter.account_id {
            predicate = predicate.add(bid::Column::AccountId.eq(account_id));
        }

        let spec = list_spec::<bid::Entity>(&query, predicate)?;
        let uow = self.uow();
        let rows = uow.bids().filter_all(&spec)?.all(uow.db()).await?;
        let total = uow.bids().count(&spec).await?;

        Ok(Paginated::new(
            rows.into_iter().map(BidResponse::from).collect(),
            spec.page_index,
            spec.page_size,
            total,
        ))
    }

    async fn get(&self, id: Uuid) -> AppResult<BidResponse> {
        let uow = self.uow();
        Self::live_bid(&uow, id).await.map(BidResponse::from)
    }

    async fn place(
        &self,
        account_id: Uuid,
        diamond_code: String,
        amount: i64,
    ) -> AppResult<BidResponse> {
        if amount <= 0 {
            return Err(AppError::validation("Amount must be positive"));
        }

        let uow = self.uow();
        let diamond_code = diamond_code.trim().to_string();
        let highest = uow
            .bids()
            .filter_by_expression(
                Condition::all()
                    .add(bid::Column::DiamondCode.eq(diamond_code.as_str()))
                    .add(bid::Column::Status.eq(BidStatus::Active.as_str()))
                    .add(bid::Column::IsDeleted.eq(false)),
                &[] as &[&str],
            )?
            .order_by_desc(bid::Column::Amount)
            .one(uow.db())
            .await?;

        if let Some(highest) = highest {
            if amount <= highest.amount {
                return Err(AppError::bad_request(format!(
                    "Bid must exceed the current highest bid of {} VND",
                    highest.amount
                )));
            }
        }

        let now = Utc::now();
        let bid = uow
            .bids()
            .add(bid::Model {
                id: Uuid::new_v4(),
                account_id,
                diamond_code,
                amount,
                status: BidStatus::Active.as_str().to_string(),
                is_deleted: false,
                created_at: now,
                updated_at: now,
            })
            .await;
        uow.save_changes().await?;

        tracing::info!(bid_id = %bid.id, diamond = %bid.diamond_code, amount, "Bid placed");
        Ok(BidResponse::from(bid))
    }

    async fn withdraw(&self, id: Uuid, caller_id: Uuid, caller_role: Role) -> AppResult<()> {
        let uow = self.uow();
        let bid = Self::live_bid(&uow, id).await?;

        if bid.account_id != caller_id && !caller_role.is_admin() {
            return Err(AppError::Forbidden);
        }

        let withdrawn = bid::Model {
            status: BidStatus::Withdrawn.as_str().to_string(),
            updated_at: Utc::now(),
            ..bid
        };
        uow.bids().stage_update(withdrawn.clone()).await;
        uow.bids().soft_remove(withdrawn).await;
        uow.save_changes().await?;

        tracing::info!(bid_id = %id, "Bid withdrawn");
        Ok(())
    }
}

//! Payment service - VNPay deposits and paying orders from the wallet.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter};
use uuid::Uuid;

use super::list_spec;
use crate::config::{MAX_DEPOSIT_AMOUNT, MIN_DEPOSIT_AMOUNT};
use crate::domain::{
    OrderStatus, PaymentUrlResponse, TransactionKind, TransactionResponse, TransactionStatus,
    VnPaymentResponse,
};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::repositories::entities::{account, order, transaction};
use crate::infra::{PaymentRequest, UnitOfWork, VnPayClient};
use crate::types::{ListQuery, Paginated};

#[async_trait]
pub trait PaymentService: Send + Sync {
    /// Record a pending deposit and return the signed checkout URL for it
    async fn create_payment_url(
        &self,
        account_id: Uuid,
        amount: i64,
        description: String,
        client_ip: String,
    ) -> AppResult<PaymentUrlResponse>;

    /// Verify and parse the gateway callback query
    fn payment_execute(&self, params: &HashMap<String, String>) -> AppResult<VnPaymentResponse>;

    /// Settle the pending deposit a callback refers to
    async fn deposit_payment(&self, response: VnPaymentResponse) -> AppResult<TransactionResponse>;

    async fn pay_order_with_wallet_balance(
        &self,
        order_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<TransactionResponse>;

    async fn list_transactions(
        &self,
        account_id: Uuid,
        query: ListQuery,
    ) -> AppResult<Paginated<TransactionResponse>>;
}

pub struct PaymentProcessor {
    db: DatabaseConnection,
    vnpay: VnPayClient,
}

impl PaymentProcessor {
    pub fn new(db: DatabaseConnection, vnpay: VnPayClient) -> Self {
        Self { db, vnpay }
    }

    fn uow(&self) -> UnitOfWork {
        UnitOfWork::new(self.db.clone())
    }

    async fn live_account(uow: &UnitOfWork, id: Uuid) -> AppResult<account::Model> {
        uow.accounts()
            .get_by_id(id, &[])
            .await?
            .filter(|account| !account.is_deleted)
            .ok_or_not_found()
    }
}

#[async_trait]
impl PaymentService for PaymentProcessor {
    async fn create_payment_url(
        &self,
        account_id: Uuid,
        amount: i64,
        description: String,
        client_ip: String,
    ) -> AppResult<PaymentUrlResponse> {
        if !(MIN_DEPOSIT_AMOUNT..=MAX_DEPOSIT_AMOUNT).contains(&amount) {
            return Err(AppError::validation(format!(
                "Amount must be between {} and {} VND",
                MIN_DEPOSIT_AMOUNT, MAX_DEPOSIT_AMOUNT
            )));
        }

        let uow = self.uow();
        Self::live_account(&uow, account_id).await?;

        // Sign first: nothing is recorded for a request the gateway can't take
        let now = Utc::now();
        let transaction_id = Uuid::new_v4();
        let payment_url = self.vnpay.payment_url(&PaymentRequest {
            transaction_id,
            amount,
            description: description.clone(),
            client_ip,
            created_at: now,
        })?;

        let pending = uow
            .transactions()
            .add(transaction::Model {
                id: transaction_id,
                account_id,
                order_id: None,
                kind: TransactionKind::Deposit.as_str().to_string(),
                amount,
                status: TransactionStatus::Pending.as_str().to_string(),
                gateway_reference: None,
                description,
                created_at: now,
                updated_at: now,
            })
            .await;
        uow.save_changes().await?;

        tracing::info!(transaction_id = %pending.id, amount, "VNPay deposit started");
        Ok(PaymentUrlResponse {
            transaction_id: pending.id,
            payment_url,
        })
    }

    fn payment_execute(&self, params: &HashMap<String, String>) -> AppResult<VnPaymentResponse> {
        self.vnpay.parse_callback(params)
    }

    async fn deposit_payment(&self, response: VnPaymentResponse) -> AppResult<TransactionResponse> {
        let id = Uuid::parse_str(&response.transaction_ref)
            .map_err(|_| AppError::bad_request("Unknown transaction reference"))?;

        let uow = self.uow();
        let pending = uow.transactions().get_by_id(id, &[]).await?.ok_or_not_found()?;

        if pending.kind != TransactionKind::Deposit.as_str() {
            return Err(AppError::bad_request("Transaction is not a deposit"));
        }
        if pending.status != TransactionStatus::Pending.as_str() {
            return Err(AppError::bad_request("Transaction has already been processed"));
        }

        let now = Utc::now();
        let settled_ok = response.success && response.amount == pending.amount;
        if response.success && !settled_ok {
            tracing::warn!(
                transaction_id = %id,
                expected = pending.amount,
                reported = response.amount,
                "VNPay amount mismatch"
            );
        }

        let status = if settled_ok {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Failed
        };
        let gateway_reference = Some(response.gateway_transaction_no.clone())
            .filter(|reference| !reference.is_empty());

        // The gateway calls back more than once per payment. Only the call
        // that moves the row out of pending may touch the wallet.
        uow.transactions()
            .stage_guarded_update(
                transaction::Entity::update_many()
                    .col_expr(transaction::Column::Status, Expr::value(status.as_str()))
                    .col_expr(
                        transaction::Column::GatewayReference,
                        Expr::value(gateway_reference.clone()),
                    )
                    .col_expr(transaction::Column::UpdatedAt, Expr::value(now))
                    .filter(transaction::Column::Id.eq(id))
                    .filter(transaction::Column::Status.eq(TransactionStatus::Pending.as_str())),
            )
            .await;

        if settled_ok {
            let account = Self::live_account(&uow, pending.account_id).await?;
            if account.wallet_balance.checked_add(pending.amount).is_none() {
                return Err(AppError::bad_request("Wallet balance would overflow"));
            }
            uow.accounts()
                .stage_guarded_update(
                    account::Entity::update_many()
                        .col_expr(
                            account::Column::WalletBalance,
                            Expr::col(account::Column::WalletBalance).add(pending.amount),
                        )
                        .col_expr(account::Column::UpdatedAt, Expr::value(now))
                        .filter(account::Column::Id.eq(account.id))
                        .filter(account::Column::IsDeleted.eq(false)),
                )
                .await;
        }

        uow.save_changes().await.map_err(|e| {
            if e.is_stale_write() {
                AppError::bad_request("Transaction has already been processed")
            } else {
                e
            }
        })?;

        let settled = transaction::Model {
            status: status.as_str().to_string(),
            gateway_reference,
            updated_at: now,
            ..pending
        };
        tracing::info!(transaction_id = %id, status = status.as_str(), "VNPay deposit settled");
        Ok(TransactionResponse::from(settled))
    }

    async fn pay_order_with_wallet_balance(
        &self,
        order_id: Uuid,
        account_id: Uuid,
    ) -> AppResult<TransactionResponse> {
        let uow = self.uow();
        let order = uow
            .orders()
            .get_by_id(order_id, &[])
            .await?
            .filter(|order| !order.is_deleted)
            .ok_or_not_found()?;

        if order.account_id != account_id {
            return Err(AppError::Forbidden);
        }
        if order.status != OrderStatus::Pending.as_str() {
            return Err(AppError::bad_request("Order is not awaiting payment"));
        }

        let account = Self::live_account(&uow, account_id).await?;
        let total = order.total_amount;
        if account.wallet_balance < total {
            return Err(AppError::bad_request("Insufficient wallet balance"));
        }

        // Both checks above are repeated inside the commit, where a
        // concurrent payment can no longer slip between read and write.
        let now = Utc::now();
        uow.orders()
            .stage_guarded_update(
                order::Entity::update_many()
                    .col_expr(order::Column::Status, Expr::value(OrderStatus::Paid.as_str()))
                    .col_expr(order::Column::UpdatedAt, Expr::value(now))
                    .filter(order::Column::Id.eq(order_id))
                    .filter(order::Column::AccountId.eq(account_id))
                    .filter(order::Column::Status.eq(OrderStatus::Pending.as_str())),
            )
            .await;
        uow.accounts()
            .stage_guarded_update(
                account::Entity::update_many()
                    .col_expr(
                        account::Column::WalletBalance,
                        Expr::col(account::Column::WalletBalance).sub(total),
                    )
                    .col_expr(account::Column::UpdatedAt, Expr::value(now))
                    .filter(account::Column::Id.eq(account_id))
                    .filter(account::Column::IsDeleted.eq(false))
                    .filter(account::Column::WalletBalance.gte(total)),
            )
            .await;
        let payment = uow
            .transactions()
            .add(transaction::Model {
                id: Uuid::new_v4(),
                account_id,
                order_id: Some(order_id),
                kind: TransactionKind::Payment.as_str().to_string(),
                amount: total,
                status: TransactionStatus::Completed.as_str().to_string(),
                gateway_reference: None,
                description: format!("Wallet payment for order {}", order_id),
                created_at: now,
                updated_at: now,
            })
            .await;
        uow.save_changes().await.map_err(|e| {
            if e.is_stale_write() {
                tracing::warn!(%order_id, %account_id, "Wallet payment lost a concurrent update");
                AppError::bad_request("Order is no longer payable from this wallet")
            } else {
                e
            }
        })?;

        tracing::info!(%order_id, %account_id, amount = total, "Order paid from wallet");
        Ok(TransactionResponse::from(payment))
    }

    async fn list_transactions(
        &self,
        account_id: Uuid,
        query: ListQuery,
    ) -> AppResult<Paginated<TransactionResponse>> {
        let predicate = Condition::all().add(transaction::Column::AccountId.eq(account_id));
        let spec = list_spec::<transaction::Entity>(&query, predicate)?;

        let uow = self.uow();
        let rows = uow.transactions().filter_all(&spec)?.all(uow.db()).await?;
        let total = uow.transactions().count(&spec).await?;

        Ok(Paginated::new(
            rows.into_iter().map(TransactionResponse::from).collect(),
            spec.page_index,
            spec.page_size,
            total,
        ))
    }
}

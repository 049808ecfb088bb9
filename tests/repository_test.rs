//! Generic repository and Unit of Work against an in-memory SQLite database.

mod common;

use chrono::{Duration, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Select};

use diamond_shop::errors::AppError;
use diamond_shop::infra::repositories::entities::{account, account_token, bid};
use diamond_shop::infra::repositories::OrderTransform;
use diamond_shop::infra::{QuerySpec, UnitOfWork};

use common::setup_db;

async fn seeded() -> (UnitOfWork, account::Model, Vec<bid::Model>) {
    let db = setup_db().await;
    let uow = UnitOfWork::new(db);

    let owner = uow.accounts().add(common::account("abc@gmail.com")).await;
    let amounts = [300, 100, 500, 200, 400];
    let mut bids = Vec::new();
    for amount in amounts {
        bids.push(uow.bids().add(common::bid(owner.id, "GIA-1", amount)).await);
    }
    uow.save_changes().await.unwrap();

    (uow, owner, bids)
}

fn amounts(rows: &[bid::Model]) -> Vec<i64> {
    rows.iter().map(|b| b.amount).collect()
}

#[tokio::test]
async fn staged_writes_are_invisible_until_saved() {
    let uow = UnitOfWork::new(setup_db().await);
    let account = uow.accounts().add(common::account("abc@gmail.com")).await;

    assert!(uow.accounts().context().has_changes().await);
    assert!(uow.accounts().get_by_id(account.id, &[]).await.unwrap().is_none());

    assert_eq!(uow.save_changes().await.unwrap(), 1);
    assert!(!uow.accounts().context().has_changes().await);
    let stored = uow.accounts().get_by_id(account.id, &[]).await.unwrap().unwrap();
    assert_eq!(stored.id, account.id);
    assert_eq!(stored.email, account.email);
    assert_eq!(stored.user_name, account.user_name);
    assert_eq!(stored.role, account.role);
    assert!(!stored.is_deleted);
}

#[tokio::test]
async fn discarded_changes_never_reach_the_database() {
    let uow = UnitOfWork::new(setup_db().await);
    uow.accounts().add(common::account("a@gmail.com")).await;
    uow.accounts().add(common::account("b@gmail.com")).await;

    assert_eq!(uow.discard_changes().await, 2);
    assert_eq!(uow.save_changes().await.unwrap(), 0);
    assert!(uow.accounts().get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn failed_save_rolls_back_every_staged_write() {
    let uow = UnitOfWork::new(setup_db().await);
    let first = uow.accounts().add(common::account("a@gmail.com")).await;
    // Same primary key, so the second insert fails inside the transaction
    let clash = account::Model {
        email: "b@gmail.com".to_string(),
        ..first.clone()
    };
    uow.accounts().add(clash).await;

    assert!(matches!(uow.save_changes().await, Err(AppError::Database(_))));
    assert!(uow.accounts().get_by_id(first.id, &[]).await.unwrap().is_none());

    // The queue was cleared by the failed save
    assert_eq!(uow.save_changes().await.unwrap(), 0);
}

#[tokio::test]
async fn repositories_of_one_unit_commit_together() {
    let uow = UnitOfWork::new(setup_db().await);
    let owner = uow.accounts().add(common::account("abc@gmail.com")).await;
    uow.bids()
        .add_range(vec![
            common::bid(owner.id, "GIA-9", 1_000),
            common::bid(owner.id, "GIA-9", 2_000),
        ])
        .await;
    uow.orders().add(common::order(owner.id, 5_000)).await;

    assert_eq!(uow.save_changes().await.unwrap(), 4);
    assert_eq!(uow.bids().get_all().await.unwrap().len(), 2);
    assert_eq!(uow.orders().get_all().await.unwrap().len(), 1);
}

#[tokio::test]
async fn filter_all_orders_by_field_name_and_pages_from_zero() {
    let (uow, _, _) = seeded().await;

    let first = QuerySpec::new().order_by("amount", false).page(0, 2);
    let rows = uow.bids().filter_all(&first).unwrap().all(uow.db()).await.unwrap();
    assert_eq!(amounts(&rows), vec![500, 400]);

    let third = QuerySpec::new().order_by("Amount", false).page(2, 2);
    let rows = uow.bids().filter_all(&third).unwrap().all(uow.db()).await.unwrap();
    assert_eq!(amounts(&rows), vec![100]);
}

#[tokio::test]
async fn ascending_and_descending_are_reverses() {
    let (uow, _, _) = seeded().await;

    let ascending = QuerySpec::new().order_by("amount", true).unpaged();
    let descending = QuerySpec::new().order_by("amount", false).unpaged();
    let up = uow.bids().filter_all(&ascending).unwrap().all(uow.db()).await.unwrap();
    let mut down = uow.bids().filter_all(&descending).unwrap().all(uow.db()).await.unwrap();
    down.reverse();

    assert_eq!(amounts(&up), vec![100, 200, 300, 400, 500]);
    assert_eq!(amounts(&up), amounts(&down));
}

#[tokio::test]
async fn order_field_names_are_normalized() {
    let (uow, _, _) = seeded().await;

    for name in ["created_at", "createdAt", "CreatedAt", " created_at "] {
        let spec = QuerySpec::new().order_by(name, true);
        assert!(uow.bids().filter_all(&spec).is_ok(), "{name}");
    }
}

#[tokio::test]
async fn unknown_order_field_is_a_contract_violation() {
    let (uow, _, _) = seeded().await;

    let spec = QuerySpec::new().order_by("carat", true);
    assert!(matches!(
        uow.bids().filter_all(&spec),
        Err(AppError::ContractViolation(_))
    ));
}

#[tokio::test]
async fn predicate_and_count_ignore_paging() {
    let (uow, _, _) = seeded().await;

    let spec = QuerySpec::new()
        .filter(Condition::all().add(bid::Column::Amount.gte(200)))
        .order_by("amount", true)
        .page(0, 2);

    let rows = uow.bids().filter_all(&spec).unwrap().all(uow.db()).await.unwrap();
    assert_eq!(amounts(&rows), vec![200, 300]);
    assert_eq!(uow.bids().count(&spec).await.unwrap(), 4);

    let all = uow
        .bids()
        .get_all_without_paging(&spec)
        .unwrap()
        .all(uow.db())
        .await
        .unwrap();
    assert_eq!(amounts(&all), vec![200, 300, 400, 500]);
}

#[tokio::test]
async fn zero_page_size_returns_everything() {
    let (uow, _, _) = seeded().await;

    let spec = QuerySpec::new().page(3, 0);
    let rows = uow.bids().filter_all(&spec).unwrap().all(uow.db()).await.unwrap();
    assert_eq!(rows.len(), 5);
}

#[tokio::test]
async fn includes_join_relations_by_name() {
    let (uow, owner, _) = seeded().await;

    let spec = QuerySpec::new()
        .filter(Condition::all().add(account::Column::Email.eq(owner.email.as_str())))
        .include("Account")
        .include("account");
    let rows = uow.bids().filter_all(&spec).unwrap().all(uow.db()).await.unwrap();
    assert_eq!(rows.len(), 5);

    let rows = uow
        .bids()
        .filter_by_expression(Condition::all().add(account::Column::Email.eq("nobody@gmail.com")), &["account"])
        .unwrap()
        .all(uow.db())
        .await
        .unwrap();
    assert!(rows.is_empty());
}

#[tokio::test]
async fn unknown_include_is_a_contract_violation() {
    let (uow, _, _) = seeded().await;

    let spec = QuerySpec::new().include("certificate");
    assert!(matches!(
        uow.bids().filter_all(&spec),
        Err(AppError::ContractViolation(_))
    ));
    assert!(matches!(
        uow.bids().filter_by_expression(Condition::all(), &["certificate"]),
        Err(AppError::ContractViolation(_))
    ));
}

#[tokio::test]
async fn get_by_id_with_include() {
    let (uow, owner, bids) = seeded().await;

    let found = uow
        .bids()
        .get_by_id(bids[0].id, &[bid::Relation::Account])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.account_id, owner.id);
    assert!(uow.bids().get_by_id(uuid::Uuid::new_v4(), &[]).await.unwrap().is_none());
}

#[tokio::test]
async fn get_by_id_with_related_loads_the_account() {
    let (uow, owner, bids) = seeded().await;

    let (found, account) = uow
        .bids()
        .get_by_id_with_related::<_, account::Entity>(bids[0].id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(found.id, bids[0].id);
    assert_eq!(account.map(|a| a.email), Some(owner.email));

    let missing = uow
        .bids()
        .get_by_id_with_related::<_, account::Entity>(uuid::Uuid::new_v4())
        .await
        .unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn find_single_rejects_several_matches() {
    let (uow, _, bids) = seeded().await;

    let one = uow
        .bids()
        .find_single(Some(Condition::all().add(bid::Column::Id.eq(bids[2].id))), &[])
        .await
        .unwrap();
    assert_eq!(one.map(|b| b.amount), Some(500));

    let none = uow
        .bids()
        .find_single(Some(Condition::all().add(bid::Column::Amount.gt(10_000))), &[])
        .await
        .unwrap();
    assert!(none.is_none());

    let many = uow
        .bids()
        .find_single(Some(Condition::all().add(bid::Column::DiamondCode.eq("GIA-1"))), &[])
        .await;
    assert!(matches!(many, Err(AppError::ContractViolation(_))));
}

#[tokio::test]
#[allow(deprecated)]
async fn legacy_get_pages_from_one() {
    let (uow, _, _) = seeded().await;

    let by_amount = || -> Option<OrderTransform<bid::Entity>> {
        Some(Box::new(|select: Select<bid::Entity>| {
            select.order_by_asc(bid::Column::Amount)
        }))
    };

    let first = uow.bids().get(None, by_amount(), "", Some(1), Some(2)).await.unwrap();
    assert_eq!(amounts(&first), vec![100, 200]);

    let second = uow.bids().get(None, by_amount(), "account", Some(2), Some(2)).await.unwrap();
    assert_eq!(amounts(&second), vec![300, 400]);

    // Non-positive index is the first page; non-positive size the default
    let clamped = uow.bids().get(None, by_amount(), "", Some(0), Some(0)).await.unwrap();
    assert_eq!(clamped.len(), 5);

    // Page 1 of the legacy API is page 0 of filter_all
    let canonical = QuerySpec::new().order_by("amount", true).page(0, 10);
    let canonical = uow.bids().filter_all(&canonical).unwrap().all(uow.db()).await.unwrap();
    let legacy = uow.bids().get(None, by_amount(), "", Some(1), Some(10)).await.unwrap();
    assert_eq!(legacy, canonical);

    // Paging needs both values
    let unpaged = uow.bids().get(None, by_amount(), "", Some(2), None).await.unwrap();
    assert_eq!(unpaged.len(), 5);

    let filtered = uow
        .bids()
        .get(
            Some(Condition::all().add(bid::Column::Amount.lt(300))),
            None,
            " , account",
            None,
            None,
        )
        .await
        .unwrap();
    assert_eq!(filtered.len(), 2);
}

#[tokio::test]
#[allow(deprecated)]
async fn legacy_get_past_the_last_page_is_empty() {
    let (uow, _, _) = seeded().await;

    let far = uow
        .bids()
        .get(None, None, "", Some(i64::MAX), Some(i64::MAX))
        .await
        .unwrap();
    assert!(far.is_empty());

    let spec = QuerySpec::new().page(u64::MAX, 2);
    let far = uow.bids().filter_all(&spec).unwrap().all(uow.db()).await.unwrap();
    assert!(far.is_empty());
}

#[tokio::test]
async fn updates_are_staged_and_committed() {
    let (uow, _, bids) = seeded().await;

    let raised: Vec<bid::Model> = bids
        .iter()
        .take(2)
        .map(|b| bid::Model {
            amount: b.amount + 1_000,
            ..b.clone()
        })
        .collect();
    uow.bids().update_range(raised).await;
    assert_eq!(uow.save_changes().await.unwrap(), 2);

    let stored = uow.bids().get_by_id(bids[0].id, &[]).await.unwrap().unwrap();
    assert_eq!(stored.amount, 1_300);

    uow.bids()
        .stage_update_and_commit(bid::Model {
            diamond_code: "GIA-2".to_string(),
            ..stored
        })
        .await
        .unwrap();
    let stored = uow.bids().get_by_id(bids[0].id, &[]).await.unwrap().unwrap();
    assert_eq!(stored.diamond_code, "GIA-2");
    assert_eq!(stored.amount, 1_300);
}

#[tokio::test]
async fn soft_remove_keeps_the_row() {
    let (uow, _, bids) = seeded().await;

    uow.bids().soft_remove(bids[0].clone()).await;
    uow.bids().soft_remove_range(bids[1..3].to_vec()).await;
    uow.save_changes().await.unwrap();

    let stored = uow.bids().get_by_id(bids[0].id, &[]).await.unwrap().unwrap();
    assert!(stored.is_deleted);
    assert_eq!(stored.amount, bids[0].amount);

    assert_eq!(uow.bids().get_all().await.unwrap().len(), 5);
    let live = QuerySpec::new().filter(Condition::all().add(bid::Column::IsDeleted.eq(false)));
    assert_eq!(uow.bids().count(&live).await.unwrap(), 2);
}

#[tokio::test]
async fn remove_deletes_the_row() {
    let (uow, _, bids) = seeded().await;

    let removed = uow.bids().remove(bids[0].clone()).await;
    assert_eq!(removed.id, bids[0].id);
    uow.save_changes().await.unwrap();

    assert!(uow.bids().get_by_id(bids[0].id, &[]).await.unwrap().is_none());
    assert_eq!(bid::Entity::find().all(uow.db()).await.unwrap().len(), 4);
}

fn token_row(account_id: uuid::Uuid, refresh_token: &str) -> account_token::Model {
    let now = Utc::now();
    account_token::Model {
        id: uuid::Uuid::new_v4(),
        account_id,
        jwt_id: format!("jti-{}", refresh_token),
        refresh_token: refresh_token.to_string(),
        expires_at: now + Duration::days(7),
        created_at: now,
    }
}

fn replace_token() -> OnConflict {
    OnConflict::column(account_token::Column::AccountId)
        .update_columns([
            account_token::Column::JwtId,
            account_token::Column::RefreshToken,
            account_token::Column::ExpiresAt,
        ])
        .to_owned()
}

#[tokio::test]
async fn add_or_update_keeps_one_row_per_key() {
    let uow = UnitOfWork::new(setup_db().await);
    let owner = uow.accounts().add(common::account("abc@gmail.com")).await;
    uow.save_changes().await.unwrap();

    let first = uow
        .account_tokens()
        .add_or_update(token_row(owner.id, "first"), replace_token())
        .await;
    uow.save_changes().await.unwrap();
    uow.account_tokens()
        .add_or_update(token_row(owner.id, "second"), replace_token())
        .await;
    uow.save_changes().await.unwrap();

    let rows = uow.account_tokens().get_all().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, first.id);
    assert_eq!(rows[0].refresh_token, "second");
    assert_eq!(rows[0].jwt_id, "jti-second");
}

#[tokio::test]
async fn second_token_row_for_an_account_is_refused() {
    let uow = UnitOfWork::new(setup_db().await);
    let owner = uow.accounts().add(common::account("abc@gmail.com")).await;
    uow.account_tokens().add(token_row(owner.id, "first")).await;
    uow.save_changes().await.unwrap();

    uow.account_tokens().add(token_row(owner.id, "second")).await;
    let err = uow.save_changes().await.unwrap_err();
    assert!(err.is_unique_violation(), "{err:?}");
}

#[tokio::test]
async fn guarded_update_that_matches_nothing_rolls_back_the_unit() {
    let (uow, owner, bids) = seeded().await;

    uow.orders().add(common::order(owner.id, 5_000)).await;
    uow.bids()
        .stage_guarded_update(
            bid::Entity::update_many()
                .col_expr(bid::Column::Amount, Expr::col(bid::Column::Amount).add(1))
                .filter(bid::Column::Id.eq(bids[0].id))
                .filter(bid::Column::Amount.gt(10_000)),
        )
        .await;

    let err = uow.save_changes().await.unwrap_err();
    assert!(err.is_stale_write());
    assert!(uow.orders().get_all().await.unwrap().is_empty());

    uow.bids()
        .stage_guarded_update(
            bid::Entity::update_many()
                .col_expr(bid::Column::Amount, Expr::col(bid::Column::Amount).add(1))
                .filter(bid::Column::Id.eq(bids[0].id)),
        )
        .await;
    uow.save_changes().await.unwrap();
    let stored = uow.bids().get_by_id(bids[0].id, &[]).await.unwrap().unwrap();
    assert_eq!(stored.amount, bids[0].amount + 1);
}

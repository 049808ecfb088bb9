//! Account database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::{AccountResponse, Role};
use crate::infra::repositories::{Navigation, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub user_name: String,
    pub password_hash: String,
    pub role: String,
    /// Wallet balance in VND
    pub wallet_balance: i64,
    pub is_deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_token::Entity")]
    AccountTokens,
    #[sea_orm(has_many = "super::bid::Entity")]
    Bids,
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::account_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountTokens.def()
    }
}

impl Related<super::bid::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bids.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Accounts only own collections; nothing to join one-to-one.
impl Navigation for Entity {
    fn navigation(_name: &str) -> Option<Relation> {
        None
    }
}

impl SoftDelete for Entity {
    fn deleted_flag() -> Column {
        Column::IsDeleted
    }
}

impl From<Model> for AccountResponse {
    fn from(model: Model) -> Self {
        AccountResponse {
            id: model.id,
            email: model.email,
            user_name: model.user_name,
            role: Role::from(model.role.as_str()),
            wallet_balance: model.wallet_balance,
            created_at: model.created_at,
        }
    }
}

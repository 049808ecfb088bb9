//! Bid database entity for SeaORM.

use sea_orm::entity::prelude::*;

use crate::domain::BidResponse;
use crate::infra::repositories::{Navigation, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "bids")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub diamond_code: String,
    /// Offered amount in VND
    pub amount: i64,
    pub status: String,
    pub is_deleted: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id"
    )]
    Account,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Navigation for Entity {
    fn navigation(name: &str) -> Option<Relation> {
        match name {
            "account" => Some(Relation::Account),
            _ => None,
        }
    }
}

impl SoftDelete for Entity {
    fn deleted_flag() -> Column {
        Column::IsDeleted
    }
}

impl From<Model> for BidResponse {
    fn from(model: Model) -> Self {
        BidResponse {
            id: model.id,
            account_id: model.account_id,
            diamond_code: model.diamond_code,
            amount: model.amount,
            status: model.status,
            created_at: model.created_at,
        }
    }
}

//! Customer order. Only the fields payment needs are modelled here.

use sea_orm::entity::prelude::*;

use crate::infra::repositories::{Navigation, SoftDelete};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    /// Order total in VND
    pub total_amount: i64,
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
    #[sea_orm(has_many = "super::transaction::Entity")]
    Transactions,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::transaction::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
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

//! Refresh token storage, one row per account.

use sea_orm::entity::prelude::*;

use crate::infra::repositories::Navigation;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "account_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub account_id: Uuid,
    /// `jti` of the access token issued together with this refresh token
    pub jwt_id: String,
    #[sea_orm(unique)]
    pub refresh_token: String,
    pub expires_at: DateTimeUtc,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::account::Entity",
        from = "Column::AccountId",
        to = "super::account::Column::Id",
        on_delete = "Cascade"
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

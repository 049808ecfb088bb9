//! Wallet transaction: VNPay deposits and wallet payments.

use sea_orm::entity::prelude::*;

use crate::domain::TransactionResponse;
use crate::infra::repositories::Navigation;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub account_id: Uuid,
    pub order_id: Option<Uuid>,
    pub kind: String,
    /// Amount in VND
    pub amount: i64,
    pub status: String,
    /// `vnp_TransactionNo` once the gateway reports back
    pub gateway_reference: Option<String>,
    pub description: String,
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
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::account::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Navigation for Entity {
    fn navigation(name: &str) -> Option<Relation> {
        match name {
            "account" => Some(Relation::Account),
            "order" => Some(Relation::Order),
            _ => None,
        }
    }
}

impl From<Model> for TransactionResponse {
    fn from(model: Model) -> Self {
        TransactionResponse {
            id: model.id,
            account_id: model.account_id,
            order_id: model.order_id,
            kind: model.kind,
            amount: model.amount,
            status: model.status,
            gateway_reference: model.gateway_reference,
            description: model.description,
            created_at: model.created_at,
        }
    }
}

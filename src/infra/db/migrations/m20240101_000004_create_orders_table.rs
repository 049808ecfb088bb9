//! Migration: Create orders table.

use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_accounts_table::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Orders::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Orders::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Orders::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Orders::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_orders_account")
                            .from(Orders::Table, Orders::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub(super) enum Orders {
    Table,
    Id,
    AccountId,
    TotalAmount,
    Status,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

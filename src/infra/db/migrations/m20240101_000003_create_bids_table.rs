//! Migration: Create bids table.

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
                    .table(Bids::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Bids::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Bids::AccountId).uuid().not_null())
                    .col(ColumnDef::new(Bids::DiamondCode).string_len(64).not_null())
                    .col(ColumnDef::new(Bids::Amount).big_integer().not_null())
                    .col(ColumnDef::new(Bids::Status).string_len(20).not_null())
                    .col(
                        ColumnDef::new(Bids::IsDeleted)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Bids::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Bids::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bids_account")
                            .from(Bids::Table, Bids::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // Highest-bid lookups filter by diamond
        manager
            .create_index(
                Index::create()
                    .name("idx_bids_diamond_code")
                    .table(Bids::Table)
                    .col(Bids::DiamondCode)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bids::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Bids {
    Table,
    Id,
    AccountId,
    DiamondCode,
    Amount,
    Status,
    IsDeleted,
    CreatedAt,
    UpdatedAt,
}

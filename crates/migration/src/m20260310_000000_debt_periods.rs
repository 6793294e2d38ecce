//! Period ledger: one row per `(partner_kind, partner_id, period)`.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DebtPeriods::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DebtPeriods::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DebtPeriods::PartnerKind).string().not_null())
                    .col(ColumnDef::new(DebtPeriods::PartnerId).string().not_null())
                    .col(ColumnDef::new(DebtPeriods::Period).string().not_null())
                    .col(
                        ColumnDef::new(DebtPeriods::OpeningBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DebtPeriods::IncreasingAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DebtPeriods::DecreasingAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DebtPeriods::ReturnAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DebtPeriods::AdjustmentAmount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(DebtPeriods::ClosingBalance)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DebtPeriods::Notes).string())
                    .col(ColumnDef::new(DebtPeriods::StartTime).timestamp().not_null())
                    .col(ColumnDef::new(DebtPeriods::EndTime).timestamp().not_null())
                    .col(
                        ColumnDef::new(DebtPeriods::IsLocked)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DebtPeriods::CreatedAt).timestamp().not_null())
                    .col(ColumnDef::new(DebtPeriods::UpdatedAt).timestamp().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debt_periods-partner-period-unique")
                    .table(DebtPeriods::Table)
                    .col(DebtPeriods::PartnerKind)
                    .col(DebtPeriods::PartnerId)
                    .col(DebtPeriods::Period)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Year-wide scans (audit, untyped list).
        manager
            .create_index(
                Index::create()
                    .name("idx-debt_periods-period")
                    .table(DebtPeriods::Table)
                    .col(DebtPeriods::Period)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtPeriods::Table).to_owned())
            .await
    }
}

/// Learn more at https://docs.rs/sea-query#iden
#[derive(Iden)]
pub enum DebtPeriods {
    Table,
    Id,
    PartnerKind,
    PartnerId,
    Period,
    OpeningBalance,
    IncreasingAmount,
    DecreasingAmount,
    ReturnAmount,
    AdjustmentAmount,
    ClosingBalance,
    Notes,
    StartTime,
    EndTime,
    IsLocked,
    CreatedAt,
    UpdatedAt,
}

//! Partner directory and the event sources the debt ledger reads.
//!
//! - `customers` / `suppliers`: partner master data, including the
//!   denormalized live balance and the responsible user
//! - `sales_orders` / `purchase_orders`: increase events
//! - `payment_receipts` / `payment_vouchers`: decrease events
//! - `debt_adjustments`: returns and manual adjustments, for both roles

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

// ─────────────────────────────────────────────────────────────────────────────
// Table identifiers
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Iden)]
pub enum Customers {
    Table,
    Id,
    Code,
    Name,
    Email,
    Phone,
    CurrentDebt,
    DebtUpdatedAt,
    AssignedUserId,
}

#[derive(Iden)]
pub enum Suppliers {
    Table,
    Id,
    Code,
    Name,
    Email,
    Phone,
    TotalPayable,
    PayableUpdatedAt,
    AssignedUserId,
}

#[derive(Iden)]
enum SalesOrders {
    Table,
    Id,
    Code,
    CustomerId,
    TotalAmount,
    Status,
    OrderDate,
}

#[derive(Iden)]
enum PurchaseOrders {
    Table,
    Id,
    Code,
    SupplierId,
    TotalAmount,
    Status,
    OrderDate,
}

#[derive(Iden)]
enum PaymentReceipts {
    Table,
    Id,
    Code,
    CustomerId,
    Amount,
    ReceiptDate,
    Note,
}

#[derive(Iden)]
enum PaymentVouchers {
    Table,
    Id,
    Code,
    SupplierId,
    Amount,
    PaymentDate,
    Note,
}

#[derive(Iden)]
enum DebtAdjustments {
    Table,
    Id,
    PartnerKind,
    PartnerId,
    Kind,
    Amount,
    OccurredAt,
    Note,
}

// ─────────────────────────────────────────────────────────────────────────────
// Migration implementation
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // ───────────────────────────────────────────────────────────────────
        // 1. Partners
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(Customers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Customers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Customers::Code).string().not_null())
                    .col(ColumnDef::new(Customers::Name).string().not_null())
                    .col(ColumnDef::new(Customers::Email).string())
                    .col(ColumnDef::new(Customers::Phone).string())
                    .col(
                        ColumnDef::new(Customers::CurrentDebt)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Customers::DebtUpdatedAt).timestamp())
                    .col(ColumnDef::new(Customers::AssignedUserId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-customers-code-unique")
                    .table(Customers::Table)
                    .col(Customers::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Suppliers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Suppliers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Suppliers::Code).string().not_null())
                    .col(ColumnDef::new(Suppliers::Name).string().not_null())
                    .col(ColumnDef::new(Suppliers::Email).string())
                    .col(ColumnDef::new(Suppliers::Phone).string())
                    .col(
                        ColumnDef::new(Suppliers::TotalPayable)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Suppliers::PayableUpdatedAt).timestamp())
                    .col(ColumnDef::new(Suppliers::AssignedUserId).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-suppliers-code-unique")
                    .table(Suppliers::Table)
                    .col(Suppliers::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 2. Orders
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(SalesOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SalesOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(SalesOrders::Code).string().not_null())
                    .col(ColumnDef::new(SalesOrders::CustomerId).string().not_null())
                    .col(
                        ColumnDef::new(SalesOrders::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(SalesOrders::Status).string().not_null())
                    .col(ColumnDef::new(SalesOrders::OrderDate).timestamp().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-sales_orders-customer_id")
                            .from(SalesOrders::Table, SalesOrders::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-sales_orders-customer_id-order_date")
                    .table(SalesOrders::Table)
                    .col(SalesOrders::CustomerId)
                    .col(SalesOrders::OrderDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PurchaseOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseOrders::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Code).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::SupplierId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseOrders::TotalAmount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseOrders::Status).string().not_null())
                    .col(
                        ColumnDef::new(PurchaseOrders::OrderDate)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-purchase_orders-supplier_id")
                            .from(PurchaseOrders::Table, PurchaseOrders::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-purchase_orders-supplier_id-order_date")
                    .table(PurchaseOrders::Table)
                    .col(PurchaseOrders::SupplierId)
                    .col(PurchaseOrders::OrderDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 3. Payments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(PaymentReceipts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentReceipts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentReceipts::Code).string().not_null())
                    .col(
                        ColumnDef::new(PaymentReceipts::CustomerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentReceipts::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentReceipts::ReceiptDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentReceipts::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_receipts-customer_id")
                            .from(PaymentReceipts::Table, PaymentReceipts::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_receipts-customer_id-receipt_date")
                    .table(PaymentReceipts::Table)
                    .col(PaymentReceipts::CustomerId)
                    .col(PaymentReceipts::ReceiptDate)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PaymentVouchers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PaymentVouchers::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PaymentVouchers::Code).string().not_null())
                    .col(
                        ColumnDef::new(PaymentVouchers::SupplierId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentVouchers::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PaymentVouchers::PaymentDate)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PaymentVouchers::Note).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-payment_vouchers-supplier_id")
                            .from(PaymentVouchers::Table, PaymentVouchers::SupplierId)
                            .to(Suppliers::Table, Suppliers::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-payment_vouchers-supplier_id-payment_date")
                    .table(PaymentVouchers::Table)
                    .col(PaymentVouchers::SupplierId)
                    .col(PaymentVouchers::PaymentDate)
                    .to_owned(),
            )
            .await?;

        // ───────────────────────────────────────────────────────────────────
        // 4. Returns and adjustments
        // ───────────────────────────────────────────────────────────────────
        manager
            .create_table(
                Table::create()
                    .table(DebtAdjustments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DebtAdjustments::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DebtAdjustments::PartnerKind)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtAdjustments::PartnerId)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DebtAdjustments::Kind).string().not_null())
                    .col(
                        ColumnDef::new(DebtAdjustments::Amount)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DebtAdjustments::OccurredAt)
                            .timestamp()
                            .not_null(),
                    )
                    .col(ColumnDef::new(DebtAdjustments::Note).string())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-debt_adjustments-partner-occurred_at")
                    .table(DebtAdjustments::Table)
                    .col(DebtAdjustments::PartnerKind)
                    .col(DebtAdjustments::PartnerId)
                    .col(DebtAdjustments::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DebtAdjustments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentVouchers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PaymentReceipts::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(PurchaseOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(SalesOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Suppliers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Customers::Table).to_owned())
            .await
    }
}

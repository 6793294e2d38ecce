//! Sales orders: the increase events of a customer ledger.
//!
//! Owned by the order subsystem; the ledger only reads them.

use sea_orm::entity::prelude::*;

/// Orders in this status never affect a debt balance.
pub const CANCELLED_STATUS: &str = "cancelled";

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "sales_orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub customer_id: String,
    pub total_amount: i64,
    pub status: String,
    pub order_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! Read-only sums over the order, payment and adjustment sources.
//!
//! Every function takes the caller's connection so a sync reads its inputs
//! inside the same transaction it writes in.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, QueryFilter, QueryOrder, Statement, Value, prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    AdjustmentKind, Money, PartnerKind, PartnerRef, PeriodTotals, PeriodYear, ResultEngine,
    debt_adjustments, payment_receipts, payment_vouchers, purchase_orders, sales_orders,
    sales_orders::CANCELLED_STATUS,
};

use super::Engine;

/// Effect of a source event on a debt balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Orders (sales for customers, purchases for suppliers).
    Increase,
    /// Payments (receipts from customers, vouchers to suppliers).
    Decrease,
    Return,
    Adjustment,
}

/// `[from, to)` in UTC; `None` leaves that side open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct DateRange {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl DateRange {
    pub fn year(year: PeriodYear) -> Self {
        Self {
            from: Some(year.start()),
            to: Some(year.end_exclusive()),
        }
    }

    /// Everything strictly before `year` starts.
    pub fn before(year: PeriodYear) -> Self {
        Self {
            from: None,
            to: Some(year.start()),
        }
    }
}

/// Table layout of one event source.
struct Source {
    table: &'static str,
    amount: &'static str,
    date: &'static str,
    /// Fixed predicate plus its bound values (partner filter included).
    predicate: String,
    values: Vec<Value>,
}

fn source(partner: PartnerRef, kind: EventKind) -> Source {
    let id = partner.id().to_string();
    match (partner.kind(), kind) {
        (PartnerKind::Customer, EventKind::Increase) => Source {
            table: "sales_orders",
            amount: "total_amount",
            date: "order_date",
            predicate: "customer_id = ? AND status <> ?".to_string(),
            values: vec![id.into(), CANCELLED_STATUS.into()],
        },
        (PartnerKind::Supplier, EventKind::Increase) => Source {
            table: "purchase_orders",
            amount: "total_amount",
            date: "order_date",
            predicate: "supplier_id = ? AND status <> ?".to_string(),
            values: vec![id.into(), CANCELLED_STATUS.into()],
        },
        (PartnerKind::Customer, EventKind::Decrease) => Source {
            table: "payment_receipts",
            amount: "amount",
            date: "receipt_date",
            predicate: "customer_id = ?".to_string(),
            values: vec![id.into()],
        },
        (PartnerKind::Supplier, EventKind::Decrease) => Source {
            table: "payment_vouchers",
            amount: "amount",
            date: "payment_date",
            predicate: "supplier_id = ?".to_string(),
            values: vec![id.into()],
        },
        (partner_kind, EventKind::Return | EventKind::Adjustment) => {
            let adjustment = if kind == EventKind::Return {
                AdjustmentKind::Return
            } else {
                AdjustmentKind::Adjustment
            };
            Source {
                table: "debt_adjustments",
                amount: "amount",
                date: "occurred_at",
                predicate: "partner_kind = ? AND partner_id = ? AND kind = ?".to_string(),
                values: vec![
                    partner_kind.as_str().into(),
                    id.into(),
                    adjustment.as_str().into(),
                ],
            }
        }
    }
}

/// Sum of `kind` events of `partner` inside `range`.
pub(crate) async fn aggregate<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    kind: EventKind,
    range: DateRange,
) -> ResultEngine<Money> {
    let Source {
        table,
        amount,
        date,
        predicate,
        mut values,
    } = source(partner, kind);

    let mut sql =
        format!("SELECT COALESCE(SUM({amount}), 0) AS sum FROM {table} WHERE {predicate}");
    if let Some(from) = range.from {
        sql.push_str(&format!(" AND {date} >= ?"));
        values.push(from.into());
    }
    if let Some(to) = range.to {
        sql.push_str(&format!(" AND {date} < ?"));
        values.push(to.into());
    }

    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    let row = db.query_one(stmt).await?;
    let sum: i64 = match row {
        Some(row) => row.try_get("", "sum")?,
        None => 0,
    };
    Ok(Money::new(sum))
}

/// All four sums of `partner` inside `range`.
pub(crate) async fn period_totals<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    range: DateRange,
) -> ResultEngine<PeriodTotals> {
    Ok(PeriodTotals {
        increase: aggregate(db, partner, EventKind::Increase, range).await?,
        decrease: aggregate(db, partner, EventKind::Decrease, range).await?,
        returns: aggregate(db, partner, EventKind::Return, range).await?,
        adjustments: aggregate(db, partner, EventKind::Adjustment, range).await?,
    })
}

/// Date of the earliest event of `partner`, if any.
pub(crate) async fn first_activity_date<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
) -> ResultEngine<Option<DateTime<Utc>>> {
    let id = partner.id().to_string();
    let (first_order, first_payment) = match partner.kind() {
        PartnerKind::Customer => {
            let order = sales_orders::Entity::find()
                .filter(sales_orders::Column::CustomerId.eq(id.clone()))
                .filter(sales_orders::Column::Status.ne(CANCELLED_STATUS))
                .order_by_asc(sales_orders::Column::OrderDate)
                .one(db)
                .await?
                .map(|m| m.order_date);
            let payment = payment_receipts::Entity::find()
                .filter(payment_receipts::Column::CustomerId.eq(id.clone()))
                .order_by_asc(payment_receipts::Column::ReceiptDate)
                .one(db)
                .await?
                .map(|m| m.receipt_date);
            (order, payment)
        }
        PartnerKind::Supplier => {
            let order = purchase_orders::Entity::find()
                .filter(purchase_orders::Column::SupplierId.eq(id.clone()))
                .filter(purchase_orders::Column::Status.ne(CANCELLED_STATUS))
                .order_by_asc(purchase_orders::Column::OrderDate)
                .one(db)
                .await?
                .map(|m| m.order_date);
            let payment = payment_vouchers::Entity::find()
                .filter(payment_vouchers::Column::SupplierId.eq(id.clone()))
                .order_by_asc(payment_vouchers::Column::PaymentDate)
                .one(db)
                .await?
                .map(|m| m.payment_date);
            (order, payment)
        }
    };
    let first_adjustment = debt_adjustments::Entity::find()
        .filter(debt_adjustments::Column::PartnerKind.eq(partner.kind().as_str()))
        .filter(debt_adjustments::Column::PartnerId.eq(id))
        .order_by_asc(debt_adjustments::Column::OccurredAt)
        .one(db)
        .await?
        .map(|m| m.occurred_at);

    Ok([first_order, first_payment, first_adjustment]
        .into_iter()
        .flatten()
        .min())
}

/// Partners with at least one increase or decrease event inside `year`, in
/// both roles, de-duplicated. Customers come first, then suppliers, each
/// ordered by id.
pub(crate) async fn active_partners<C: ConnectionTrait>(
    db: &C,
    year: PeriodYear,
) -> ResultEngine<Vec<PartnerRef>> {
    let (from, to) = (year.start(), year.end_exclusive());
    let sql = "\
        SELECT 'customer' AS partner_kind, customer_id AS partner_id FROM sales_orders \
         WHERE status <> ? AND order_date >= ? AND order_date < ? \
        UNION \
        SELECT 'customer', customer_id FROM payment_receipts \
         WHERE receipt_date >= ? AND receipt_date < ? \
        UNION \
        SELECT 'supplier', supplier_id FROM purchase_orders \
         WHERE status <> ? AND order_date >= ? AND order_date < ? \
        UNION \
        SELECT 'supplier', supplier_id FROM payment_vouchers \
         WHERE payment_date >= ? AND payment_date < ?";
    let values: Vec<Value> = vec![
        CANCELLED_STATUS.into(),
        from.into(),
        to.into(),
        from.into(),
        to.into(),
        CANCELLED_STATUS.into(),
        from.into(),
        to.into(),
        from.into(),
        to.into(),
    ];

    let stmt = Statement::from_sql_and_values(db.get_database_backend(), sql, values);
    let rows = db.query_all(stmt).await?;

    let mut partners = BTreeSet::new();
    for row in rows {
        let kind: String = row.try_get("", "partner_kind")?;
        let id: String = row.try_get("", "partner_id")?;
        partners.insert(PartnerRef::parse_stored(&kind, &id)?);
    }
    Ok(partners.into_iter().collect())
}

impl Engine {
    /// Sum of `kind` events of `partner` inside `year`.
    pub async fn aggregate_year(
        &self,
        partner: PartnerRef,
        kind: EventKind,
        year: PeriodYear,
    ) -> ResultEngine<Money> {
        aggregate(&self.database, partner, kind, DateRange::year(year)).await
    }

    /// Earliest event date of `partner`, used to bound a full replay.
    pub async fn first_activity_date(
        &self,
        partner: PartnerRef,
    ) -> ResultEngine<Option<DateTime<Utc>>> {
        first_activity_date(&self.database, partner).await
    }

    /// Partners with activity inside `year`.
    pub async fn active_partners(&self, year: PeriodYear) -> ResultEngine<Vec<PartnerRef>> {
        active_partners(&self.database, year).await
    }
}

//! List and detail read views.
//!
//! Both views are memoized as JSON in the engine's [`ViewCache`](crate::ViewCache)
//! and dropped by [`Engine::invalidate_views`] after a committed write.

use chrono::{DateTime, Utc};
use sea_orm::{
    ConnectionTrait, QueryFilter, QueryOrder, QueryResult, Statement, Value, prelude::*,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::{
    AdjustmentKind, DebtPeriod, DebtStatus, EngineError, Money, Partner, PartnerKind, PartnerRef,
    PeriodYear, ResultEngine, debt_adjustments, payment_receipts, payment_vouchers,
    purchase_orders, sales_orders,
    sales_orders::CANCELLED_STATUS,
    util::{like_pattern, normalize_optional_text},
};

use super::{
    Engine, EventKind, LIST_CACHE_PREFIX, aggregate::DateRange, detail_cache_prefix,
    partners::require_partner, periods::find_period,
};

/// Filters of [`Engine::list`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DebtListFilter {
    /// With a kind, every partner of that kind is listed (zeroed when it has
    /// no period in scope). Without one, only partners with a stored period
    /// in scope are.
    pub partner_kind: Option<PartnerKind>,
    /// Case-insensitive substring of the partner name or code.
    pub search: Option<String>,
    pub assigned_user_id: Option<String>,
    pub status: Option<DebtStatus>,
    /// Without a year each partner's latest stored period is used.
    pub year: Option<PeriodYear>,
    /// 1-based.
    pub page: u32,
    pub page_size: u32,
}

impl Default for DebtListFilter {
    fn default() -> Self {
        Self {
            partner_kind: None,
            search: None,
            assigned_user_id: None,
            status: None,
            year: None,
            page: 1,
            page_size: 20,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtListItem {
    pub partner: PartnerRef,
    pub code: String,
    pub name: String,
    pub assigned_user_id: Option<String>,
    /// Period the amounts come from; `None` for a zeroed latest-period row.
    pub year: Option<PeriodYear>,
    /// `false` when the amounts are a zeroed placeholder.
    pub has_period: bool,
    pub opening_balance: Money,
    pub increasing_amount: Money,
    pub decreasing_amount: Money,
    pub return_amount: Money,
    pub adjustment_amount: Money,
    pub closing_balance: Money,
    pub status: DebtStatus,
}

/// Totals over every row matching the filter, not only the current page.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtSummary {
    pub opening: Money,
    pub increase: Money,
    pub decrease: Money,
    pub returns: Money,
    pub adjustments: Money,
    pub closing: Money,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtListPage {
    /// `None` when each row shows its partner's latest period.
    pub year: Option<PeriodYear>,
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub summary: DebtSummary,
    pub items: Vec<DebtListItem>,
}

/// One source event of a detail view.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryLine {
    pub occurred_at: DateTime<Utc>,
    pub kind: EventKind,
    /// Document code, or the adjustment id when there is no code.
    pub reference: String,
    pub amount: Money,
    pub note: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtDetail {
    pub partner: Partner,
    /// Stored row, or [`DebtPeriod::zeroed`] when the year was never synced.
    pub period: DebtPeriod,
    pub history: Vec<HistoryLine>,
}

/// SQL fragments of one list mode.
struct ListQuery {
    from: String,
    kind: String,
    id: &'static str,
    code: &'static str,
    name: &'static str,
    assigned: &'static str,
    period_id: &'static str,
    where_clause: String,
    values: Vec<Value>,
}

fn amount_column(column: &str, zeroed: bool) -> String {
    if zeroed {
        format!("COALESCE(d.{column}, 0)")
    } else {
        format!("d.{column}")
    }
}

const AMOUNT_COLUMNS: [&str; 6] = [
    "opening_balance",
    "increasing_amount",
    "decreasing_amount",
    "return_amount",
    "adjustment_amount",
    "closing_balance",
];

/// Latest stored period label of the partner identified by `kind` and `id`.
fn latest_period(kind: &str, id: &str) -> String {
    format!(
        "(SELECT MAX(m.period) FROM debt_periods m \
         WHERE m.partner_kind = {kind} AND m.partner_id = {id})"
    )
}

fn list_query(filter: &DebtListFilter, paid_threshold: Money) -> ListQuery {
    let mut values: Vec<Value> = Vec::new();
    let mut predicates: Vec<String> = Vec::new();

    let mut query = match filter.partner_kind {
        Some(kind) => {
            let table = match kind {
                PartnerKind::Customer => "customers",
                PartnerKind::Supplier => "suppliers",
            };
            values.push(kind.as_str().into());
            let period = match filter.year {
                Some(year) => {
                    values.push(year.label().into());
                    "?".to_string()
                }
                None => latest_period(&format!("'{}'", kind.as_str()), "p.id"),
            };
            ListQuery {
                from: format!(
                    "{table} p LEFT JOIN debt_periods d \
                     ON d.partner_kind = ? AND d.partner_id = p.id AND d.period = {period}"
                ),
                kind: format!("'{}'", kind.as_str()),
                id: "p.id",
                code: "p.code",
                name: "p.name",
                assigned: "p.assigned_user_id",
                period_id: "d.id",
                where_clause: String::new(),
                values: Vec::new(),
            }
        }
        None => {
            match filter.year {
                Some(year) => {
                    predicates.push("d.period = ?".to_string());
                    values.push(year.label().into());
                }
                None => predicates.push(format!(
                    "d.period = {}",
                    latest_period("d.partner_kind", "d.partner_id")
                )),
            }
            ListQuery {
                from: "debt_periods d \
                       LEFT JOIN customers c ON d.partner_kind = 'customer' AND c.id = d.partner_id \
                       LEFT JOIN suppliers s ON d.partner_kind = 'supplier' AND s.id = d.partner_id"
                    .to_string(),
                kind: "d.partner_kind".to_string(),
                id: "d.partner_id",
                code: "COALESCE(c.code, s.code, '')",
                name: "COALESCE(c.name, s.name, '')",
                assigned: "COALESCE(c.assigned_user_id, s.assigned_user_id)",
                period_id: "d.id",
                where_clause: String::new(),
                values: Vec::new(),
            }
        }
    };
    let zeroed = filter.partner_kind.is_some();

    if let Some(search) = normalize_optional_text(filter.search.as_deref()) {
        let pattern = like_pattern(&search);
        predicates.push(format!(
            "({} LIKE ? ESCAPE '\\' OR {} LIKE ? ESCAPE '\\')",
            query.name, query.code
        ));
        values.push(pattern.clone().into());
        values.push(pattern.into());
    }
    if let Some(user_id) = normalize_optional_text(filter.assigned_user_id.as_deref()) {
        predicates.push(format!("{} = ?", query.assigned));
        values.push(user_id.into());
    }
    if let Some(status) = filter.status {
        let closing = amount_column("closing_balance", zeroed);
        let op = match status {
            DebtStatus::Unpaid => ">",
            DebtStatus::Paid => "<=",
        };
        predicates.push(format!("{closing} {op} ?"));
        values.push(paid_threshold.minor().into());
    }

    if !predicates.is_empty() {
        query.where_clause = format!(" WHERE {}", predicates.join(" AND "));
    }
    query.values = values;
    query
}

fn money_at(row: &QueryResult, column: &str) -> ResultEngine<Money> {
    let minor: i64 = row.try_get("", column)?;
    Ok(Money::new(minor))
}

impl Engine {
    /// Paged debt list with summary totals over the whole filter.
    pub async fn list(&self, filter: &DebtListFilter) -> ResultEngine<DebtListPage> {
        if filter.page == 0 {
            return Err(EngineError::InvalidFilter("page must be >= 1".to_string()));
        }
        if filter.page_size == 0 || u64::from(filter.page_size) > self.config.max_page_size {
            return Err(EngineError::InvalidFilter(format!(
                "page_size must be between 1 and {}",
                self.config.max_page_size
            )));
        }

        let key = format!("{LIST_CACHE_PREFIX}{}", serde_json::to_string(filter)?);
        if let Some(page) = self.cached(&key)? {
            return Ok(page);
        }

        let page = self.load_list(filter).await?;
        self.remember(&key, &page)?;
        Ok(page)
    }

    async fn load_list(&self, filter: &DebtListFilter) -> ResultEngine<DebtListPage> {
        let paid_threshold = self.config.paid_threshold;
        let query = list_query(filter, paid_threshold);
        let zeroed = filter.partner_kind.is_some();
        let backend = self.database.get_database_backend();

        let sums = AMOUNT_COLUMNS
            .iter()
            .map(|column| {
                format!(
                    "COALESCE(SUM({}), 0) AS {column}",
                    amount_column(column, zeroed)
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        let summary_sql = format!(
            "SELECT COUNT(*) AS total, {sums} FROM {}{}",
            query.from, query.where_clause
        );
        let summary_row = self
            .database
            .query_one(Statement::from_sql_and_values(
                backend,
                summary_sql,
                query.values.clone(),
            ))
            .await?;
        let (total, summary) = match summary_row {
            Some(row) => {
                let total: i64 = row.try_get("", "total")?;
                let summary = DebtSummary {
                    opening: money_at(&row, "opening_balance")?,
                    increase: money_at(&row, "increasing_amount")?,
                    decrease: money_at(&row, "decreasing_amount")?,
                    returns: money_at(&row, "return_amount")?,
                    adjustments: money_at(&row, "adjustment_amount")?,
                    closing: money_at(&row, "closing_balance")?,
                };
                (u64::try_from(total).unwrap_or_default(), summary)
            }
            None => (0, DebtSummary::default()),
        };

        let columns = AMOUNT_COLUMNS
            .iter()
            .map(|column| format!("{} AS {column}", amount_column(column, zeroed)))
            .collect::<Vec<_>>()
            .join(", ");
        let page_sql = format!(
            "SELECT {kind} AS partner_kind, {id} AS partner_id, {code} AS code, \
             {name} AS name, {assigned} AS assigned_user_id, {period_id} AS period_id, \
             d.period AS period, {columns} FROM {from}{where_clause} ORDER BY {name}, {id} LIMIT ? OFFSET ?",
            kind = query.kind,
            id = query.id,
            code = query.code,
            name = query.name,
            assigned = query.assigned,
            period_id = query.period_id,
            from = query.from,
            where_clause = query.where_clause,
        );
        let mut values = query.values;
        values.push(i64::from(filter.page_size).into());
        values.push((i64::from(filter.page - 1) * i64::from(filter.page_size)).into());

        let rows = self
            .database
            .query_all(Statement::from_sql_and_values(backend, page_sql, values))
            .await?;
        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let kind: String = row.try_get("", "partner_kind")?;
            let id: String = row.try_get("", "partner_id")?;
            let period_id: Option<String> = row.try_get("", "period_id")?;
            let period: Option<String> = row.try_get("", "period")?;
            let year = match (filter.year, period) {
                (Some(year), _) => Some(year),
                (None, Some(label)) => Some(label.parse::<PeriodYear>()?),
                (None, None) => None,
            };
            let closing_balance = money_at(&row, "closing_balance")?;
            items.push(DebtListItem {
                partner: PartnerRef::parse_stored(&kind, &id)?,
                code: row.try_get("", "code")?,
                name: row.try_get("", "name")?,
                assigned_user_id: row.try_get("", "assigned_user_id")?,
                year,
                has_period: period_id.is_some(),
                opening_balance: money_at(&row, "opening_balance")?,
                increasing_amount: money_at(&row, "increasing_amount")?,
                decreasing_amount: money_at(&row, "decreasing_amount")?,
                return_amount: money_at(&row, "return_amount")?,
                adjustment_amount: money_at(&row, "adjustment_amount")?,
                closing_balance,
                status: DebtStatus::of(closing_balance, paid_threshold),
            });
        }

        Ok(DebtListPage {
            year: filter.year,
            page: filter.page,
            page_size: filter.page_size,
            total,
            summary,
            items,
        })
    }

    /// Partner info, the `year` period (zeroed if absent) and that year's
    /// source events in date order.
    pub async fn detail(&self, partner: PartnerRef, year: PeriodYear) -> ResultEngine<DebtDetail> {
        let key = format!("{}{}", detail_cache_prefix(partner), year);
        if let Some(detail) = self.cached(&key)? {
            return Ok(detail);
        }

        let info = require_partner(&self.database, partner).await?;
        let period = find_period(&self.database, partner, year)
            .await?
            .unwrap_or_else(|| DebtPeriod::zeroed(partner, year));
        let history = history(&self.database, partner, DateRange::year(year)).await?;

        let detail = DebtDetail {
            partner: info,
            period,
            history,
        };
        self.remember(&key, &detail)?;
        Ok(detail)
    }

    fn cached<T: DeserializeOwned>(&self, key: &str) -> ResultEngine<Option<T>> {
        match self.cache.get(key) {
            Some(payload) => {
                tracing::debug!(key, "debt view cache hit");
                Ok(Some(serde_json::from_str(&payload)?))
            }
            None => {
                tracing::debug!(key, "debt view cache miss");
                Ok(None)
            }
        }
    }

    fn remember<T: Serialize>(&self, key: &str, value: &T) -> ResultEngine<()> {
        let payload = serde_json::to_string(value)?;
        self.cache.set(key, payload, self.config.cache_ttl());
        Ok(())
    }
}

/// Source events of `partner` inside `range`, flattened and date-ordered.
async fn history<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    range: DateRange,
) -> ResultEngine<Vec<HistoryLine>> {
    let (Some(from), Some(to)) = (range.from, range.to) else {
        return Err(EngineError::InvalidPeriod(
            "history needs a closed date range".to_string(),
        ));
    };
    let id = partner.id().to_string();
    let mut lines = Vec::new();

    match partner.kind() {
        PartnerKind::Customer => {
            let orders = sales_orders::Entity::find()
                .filter(sales_orders::Column::CustomerId.eq(id.clone()))
                .filter(sales_orders::Column::Status.ne(CANCELLED_STATUS))
                .filter(sales_orders::Column::OrderDate.gte(from))
                .filter(sales_orders::Column::OrderDate.lt(to))
                .all(db)
                .await?;
            lines.extend(orders.into_iter().map(|order| HistoryLine {
                occurred_at: order.order_date,
                kind: EventKind::Increase,
                reference: order.code,
                amount: Money::new(order.total_amount),
                note: None,
            }));

            let receipts = payment_receipts::Entity::find()
                .filter(payment_receipts::Column::CustomerId.eq(id.clone()))
                .filter(payment_receipts::Column::ReceiptDate.gte(from))
                .filter(payment_receipts::Column::ReceiptDate.lt(to))
                .all(db)
                .await?;
            lines.extend(receipts.into_iter().map(|receipt| HistoryLine {
                occurred_at: receipt.receipt_date,
                kind: EventKind::Decrease,
                reference: receipt.code,
                amount: Money::new(receipt.amount),
                note: receipt.note,
            }));
        }
        PartnerKind::Supplier => {
            let orders = purchase_orders::Entity::find()
                .filter(purchase_orders::Column::SupplierId.eq(id.clone()))
                .filter(purchase_orders::Column::Status.ne(CANCELLED_STATUS))
                .filter(purchase_orders::Column::OrderDate.gte(from))
                .filter(purchase_orders::Column::OrderDate.lt(to))
                .all(db)
                .await?;
            lines.extend(orders.into_iter().map(|order| HistoryLine {
                occurred_at: order.order_date,
                kind: EventKind::Increase,
                reference: order.code,
                amount: Money::new(order.total_amount),
                note: None,
            }));

            let vouchers = payment_vouchers::Entity::find()
                .filter(payment_vouchers::Column::SupplierId.eq(id.clone()))
                .filter(payment_vouchers::Column::PaymentDate.gte(from))
                .filter(payment_vouchers::Column::PaymentDate.lt(to))
                .all(db)
                .await?;
            lines.extend(vouchers.into_iter().map(|voucher| HistoryLine {
                occurred_at: voucher.payment_date,
                kind: EventKind::Decrease,
                reference: voucher.code,
                amount: Money::new(voucher.amount),
                note: voucher.note,
            }));
        }
    }

    let adjustments = debt_adjustments::Entity::find()
        .filter(debt_adjustments::Column::PartnerKind.eq(partner.kind().as_str()))
        .filter(debt_adjustments::Column::PartnerId.eq(id))
        .filter(debt_adjustments::Column::OccurredAt.gte(from))
        .filter(debt_adjustments::Column::OccurredAt.lt(to))
        .order_by_asc(debt_adjustments::Column::OccurredAt)
        .all(db)
        .await?;
    for adjustment in adjustments {
        let kind = match AdjustmentKind::try_from(adjustment.kind.as_str())? {
            AdjustmentKind::Return => EventKind::Return,
            AdjustmentKind::Adjustment => EventKind::Adjustment,
        };
        lines.push(HistoryLine {
            occurred_at: adjustment.occurred_at,
            kind,
            reference: adjustment.id,
            amount: Money::new(adjustment.amount),
            note: adjustment.note,
        });
    }

    // Stable: same-instant events keep increase, decrease, return, adjustment order.
    lines.sort_by_key(|line| line.occurred_at);
    Ok(lines)
}

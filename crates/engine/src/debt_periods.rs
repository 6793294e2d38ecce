//! Period ledger rows.
//!
//! One row per `(partner, year)` holds the derived balance of that partner
//! for that year:
//!
//! ```text
//! closing = opening + increase - (decrease + returns + adjustments)
//! ```
//!
//! Rows are created the first time a sync touches a `(partner, year)` and are
//! updated in place afterwards; normal operation never deletes them.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money, PartnerRef, PeriodYear, util::parse_uuid};

/// Machine-readable note recorded when the snapshot strategy had no prior
/// period and re-aggregated the whole history instead.
pub const FALLBACK_NOTE: &str = "[auto] opening=full-history-fallback";

/// Sums of source events inside one period.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodTotals {
    pub increase: Money,
    pub decrease: Money,
    pub returns: Money,
    pub adjustments: Money,
}

impl PeriodTotals {
    /// Everything on the decrease side of the balance.
    pub fn total_decrease(&self) -> Money {
        self.decrease + self.returns + self.adjustments
    }

    /// Net effect on the balance (`increase - all decreases`).
    pub fn net(&self) -> Money {
        self.increase - self.total_decrease()
    }

    pub fn is_empty(&self) -> bool {
        self.increase.is_zero()
            && self.decrease.is_zero()
            && self.returns.is_zero()
            && self.adjustments.is_zero()
    }
}

/// Closing balance of a period. No rounding happens here.
pub fn closing_balance(opening: Money, totals: &PeriodTotals) -> Money {
    opening + totals.net()
}

/// Paid/unpaid classification of a balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Paid,
    Unpaid,
}

impl DebtStatus {
    pub fn of(balance: Money, paid_threshold: Money) -> Self {
        if balance > paid_threshold {
            Self::Unpaid
        } else {
            Self::Paid
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Paid => "paid",
            Self::Unpaid => "unpaid",
        }
    }
}

impl TryFrom<&str> for DebtStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "paid" => Ok(Self::Paid),
            "unpaid" => Ok(Self::Unpaid),
            other => Err(EngineError::InvalidFilter(format!(
                "invalid debt status: {other}"
            ))),
        }
    }
}

/// A persisted (or placeholder) ledger period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtPeriod {
    /// `None` for a zeroed placeholder that was never persisted.
    pub id: Option<Uuid>,
    pub partner: PartnerRef,
    pub year: PeriodYear,
    pub opening_balance: Money,
    pub increasing_amount: Money,
    pub decreasing_amount: Money,
    pub return_amount: Money,
    pub adjustment_amount: Money,
    pub closing_balance: Money,
    pub notes: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_locked: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl DebtPeriod {
    /// Zero-valued placeholder for a partner without a row in `year`.
    pub fn zeroed(partner: PartnerRef, year: PeriodYear) -> Self {
        Self {
            id: None,
            partner,
            year,
            opening_balance: Money::ZERO,
            increasing_amount: Money::ZERO,
            decreasing_amount: Money::ZERO,
            return_amount: Money::ZERO,
            adjustment_amount: Money::ZERO,
            closing_balance: Money::ZERO,
            notes: None,
            start_time: year.start(),
            end_time: year.end_inclusive(),
            is_locked: false,
            created_at: None,
            updated_at: None,
        }
    }

    pub fn totals(&self) -> PeriodTotals {
        PeriodTotals {
            increase: self.increasing_amount,
            decrease: self.decreasing_amount,
            returns: self.return_amount,
            adjustments: self.adjustment_amount,
        }
    }

    /// Closing balance recomputed from the row's own components.
    pub fn expected_closing(&self) -> Money {
        closing_balance(self.opening_balance, &self.totals())
    }

    pub fn status(&self, paid_threshold: Money) -> DebtStatus {
        DebtStatus::of(self.closing_balance, paid_threshold)
    }
}

/// Appends `note` to `existing` on a new line, unless its lines already
/// appear there as one contiguous run.
pub(crate) fn append_note(existing: Option<&str>, note: Option<&str>) -> Option<String> {
    let note_lines: Vec<&str> = note
        .map(|n| n.lines().map(str::trim).filter(|l| !l.is_empty()).collect())
        .unwrap_or_default();
    if note_lines.is_empty() {
        return existing.map(str::to_string);
    }
    let note = note_lines.join("\n");
    match existing {
        None => Some(note),
        Some(existing) => {
            let existing_lines: Vec<&str> = existing.lines().map(str::trim).collect();
            if existing_lines
                .windows(note_lines.len())
                .any(|run| run == note_lines.as_slice())
            {
                Some(existing.to_string())
            } else {
                Some(format!("{existing}\n{note}"))
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "debt_periods")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub partner_kind: String,
    pub partner_id: String,
    pub period: String,
    pub opening_balance: i64,
    pub increasing_amount: i64,
    pub decreasing_amount: i64,
    pub return_amount: i64,
    pub adjustment_amount: i64,
    pub closing_balance: i64,
    pub notes: Option<String>,
    pub start_time: DateTimeUtc,
    pub end_time: DateTimeUtc,
    pub is_locked: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for DebtPeriod {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Some(parse_uuid(&model.id, "debt period")?),
            partner: PartnerRef::parse_stored(&model.partner_kind, &model.partner_id)?,
            year: model.period.parse()?,
            opening_balance: Money::new(model.opening_balance),
            increasing_amount: Money::new(model.increasing_amount),
            decreasing_amount: Money::new(model.decreasing_amount),
            return_amount: Money::new(model.return_amount),
            adjustment_amount: Money::new(model.adjustment_amount),
            closing_balance: Money::new(model.closing_balance),
            notes: model.notes,
            start_time: model.start_time,
            end_time: model.end_time,
            is_locked: model.is_locked,
            created_at: Some(model.created_at),
            updated_at: Some(model.updated_at),
        })
    }
}

impl From<&DebtPeriod> for ActiveModel {
    fn from(period: &DebtPeriod) -> Self {
        let now = Utc::now();
        Self {
            id: ActiveValue::Set(period.id.unwrap_or_else(Uuid::new_v4).to_string()),
            partner_kind: ActiveValue::Set(period.partner.kind().as_str().to_string()),
            partner_id: ActiveValue::Set(period.partner.id().to_string()),
            period: ActiveValue::Set(period.year.label()),
            opening_balance: ActiveValue::Set(period.opening_balance.minor()),
            increasing_amount: ActiveValue::Set(period.increasing_amount.minor()),
            decreasing_amount: ActiveValue::Set(period.decreasing_amount.minor()),
            return_amount: ActiveValue::Set(period.return_amount.minor()),
            adjustment_amount: ActiveValue::Set(period.adjustment_amount.minor()),
            closing_balance: ActiveValue::Set(period.closing_balance.minor()),
            notes: ActiveValue::Set(period.notes.clone()),
            start_time: ActiveValue::Set(period.start_time),
            end_time: ActiveValue::Set(period.end_time),
            is_locked: ActiveValue::Set(period.is_locked),
            created_at: ActiveValue::Set(period.created_at.unwrap_or(now)),
            updated_at: ActiveValue::Set(period.updated_at.unwrap_or(now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn totals(increase: i64, decrease: i64, returns: i64, adjustments: i64) -> PeriodTotals {
        PeriodTotals {
            increase: Money::from_units(increase),
            decrease: Money::from_units(decrease),
            returns: Money::from_units(returns),
            adjustments: Money::from_units(adjustments),
        }
    }

    #[test]
    fn closing_subtracts_every_decrease_component() {
        let closing = closing_balance(Money::from_units(100), &totals(1_000, 600, 50, 25));
        assert_eq!(closing, Money::from_units(425));
    }

    #[test]
    fn closing_may_go_negative_when_overpaid() {
        let closing = closing_balance(Money::ZERO, &totals(100, 300, 0, 0));
        assert_eq!(closing, Money::from_units(-200));
    }

    #[test]
    fn status_uses_the_paid_threshold() {
        let threshold = Money::from_units(10);
        assert_eq!(DebtStatus::of(Money::from_units(10), threshold), DebtStatus::Paid);
        assert_eq!(DebtStatus::of(Money::new(1_001), threshold), DebtStatus::Unpaid);
        assert_eq!(DebtStatus::of(Money::from_units(-5), threshold), DebtStatus::Paid);
    }

    #[test]
    fn append_note_keeps_history_and_skips_duplicates() {
        assert_eq!(append_note(None, Some("  ")), None);
        assert_eq!(append_note(None, Some("first")), Some("first".to_string()));
        assert_eq!(
            append_note(Some("first"), Some("second")),
            Some("first\nsecond".to_string())
        );
        assert_eq!(
            append_note(Some("first\nsecond"), Some("first")),
            Some("first\nsecond".to_string())
        );
        assert_eq!(append_note(Some("kept"), None), Some("kept".to_string()));
    }

    #[test]
    fn multi_line_notes_are_matched_as_a_block() {
        let once = append_note(Some("[auto] fallback"), Some("line one\r\nline two\n"));
        assert_eq!(once.as_deref(), Some("[auto] fallback\nline one\nline two"));
        assert_eq!(append_note(once.as_deref(), Some("line one\nline two")), once);
        assert_eq!(
            append_note(once.as_deref(), Some("line two\nline one")).as_deref(),
            Some("[auto] fallback\nline one\nline two\nline two\nline one")
        );
    }

    #[test]
    fn zeroed_placeholder_spans_the_year() {
        let year = PeriodYear::new(2024).unwrap();
        let period = DebtPeriod::zeroed(PartnerRef::Customer(Uuid::nil()), year);
        assert!(period.id.is_none());
        assert_eq!(period.expected_closing(), Money::ZERO);
        assert_eq!(period.start_time, year.start());
        assert_eq!(period.end_time, year.end_inclusive());
    }
}

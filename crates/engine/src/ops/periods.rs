//! Period ledger store: lookups and the insert-or-update write path.

use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, prelude::*};
use uuid::Uuid;

use crate::{
    DebtPeriod, EngineError, Money, PartnerRef, PeriodTotals, PeriodYear, ResultEngine,
    closing_balance, debt_periods, debt_periods::append_note,
};

use super::{Engine, with_tx};

pub(super) async fn find_period_model<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    year: PeriodYear,
) -> ResultEngine<Option<debt_periods::Model>> {
    debt_periods::Entity::find()
        .filter(debt_periods::Column::PartnerKind.eq(partner.kind().as_str()))
        .filter(debt_periods::Column::PartnerId.eq(partner.id().to_string()))
        .filter(debt_periods::Column::Period.eq(year.label()))
        .one(db)
        .await
        .map_err(Into::into)
}

pub(super) async fn find_period<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    year: PeriodYear,
) -> ResultEngine<Option<DebtPeriod>> {
    find_period_model(db, partner, year)
        .await?
        .map(DebtPeriod::try_from)
        .transpose()
}

pub(super) async fn periods_for_year<C: ConnectionTrait>(
    db: &C,
    year: PeriodYear,
) -> ResultEngine<Vec<DebtPeriod>> {
    debt_periods::Entity::find()
        .filter(debt_periods::Column::Period.eq(year.label()))
        .order_by_asc(debt_periods::Column::PartnerKind)
        .order_by_asc(debt_periods::Column::PartnerId)
        .all(db)
        .await?
        .into_iter()
        .map(DebtPeriod::try_from)
        .collect()
}

/// Computed values for one `(partner, year)` ready to be persisted.
#[derive(Clone, Debug)]
pub(super) struct PeriodWrite<'a> {
    pub partner: PartnerRef,
    pub year: PeriodYear,
    pub opening: Money,
    pub totals: PeriodTotals,
    pub notes: &'a [&'a str],
}

/// Inserts or updates the row keyed by `(partner, year)`.
///
/// Locked rows are never overwritten. An update that changes nothing leaves
/// the row untouched, `updated_at` included.
pub(super) async fn upsert_period<C: ConnectionTrait>(
    db: &C,
    write: PeriodWrite<'_>,
) -> ResultEngine<DebtPeriod> {
    let PeriodWrite {
        partner,
        year,
        opening,
        totals,
        notes,
    } = write;
    let closing = closing_balance(opening, &totals);

    let existing = find_period(db, partner, year).await?;
    if let Some(existing) = &existing
        && existing.is_locked
    {
        return Err(EngineError::PeriodLocked(format!("{partner} {year}")));
    }

    let mut merged_notes = existing.as_ref().and_then(|p| p.notes.clone());
    for note in notes {
        merged_notes = append_note(merged_notes.as_deref(), Some(*note));
    }

    let mut period = existing
        .clone()
        .unwrap_or_else(|| DebtPeriod::zeroed(partner, year));
    period.opening_balance = opening;
    period.increasing_amount = totals.increase;
    period.decreasing_amount = totals.decrease;
    period.return_amount = totals.returns;
    period.adjustment_amount = totals.adjustments;
    period.closing_balance = closing;
    period.notes = merged_notes;
    period.start_time = year.start();
    period.end_time = year.end_inclusive();

    match existing {
        Some(existing) if existing == period => Ok(existing),
        Some(_) => {
            period.updated_at = Some(Utc::now());
            let mut model: debt_periods::ActiveModel = (&period).into();
            // Keep the original creation time.
            model.created_at = ActiveValue::NotSet;
            model.update(db).await?;
            Ok(period)
        }
        None => {
            let now = Utc::now();
            period.id = Some(Uuid::new_v4());
            period.created_at = Some(now);
            period.updated_at = Some(now);
            let model: debt_periods::ActiveModel = (&period).into();
            model.insert(db).await?;
            Ok(period)
        }
    }
}

impl Engine {
    /// Return the stored period of `partner` for `year`, if any.
    pub async fn period(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
    ) -> ResultEngine<Option<DebtPeriod>> {
        find_period(&self.database, partner, year).await
    }

    /// Return every stored period of `partner`, oldest first.
    pub async fn periods(&self, partner: PartnerRef) -> ResultEngine<Vec<DebtPeriod>> {
        debt_periods::Entity::find()
            .filter(debt_periods::Column::PartnerKind.eq(partner.kind().as_str()))
            .filter(debt_periods::Column::PartnerId.eq(partner.id().to_string()))
            .order_by_asc(debt_periods::Column::Period)
            .all(&self.database)
            .await?
            .into_iter()
            .map(DebtPeriod::try_from)
            .collect()
    }

    /// Closes a period to further automatic recomputation.
    pub async fn lock_period(&self, partner: PartnerRef, year: PeriodYear) -> ResultEngine<()> {
        self.set_period_locked(partner, year, true).await
    }

    /// Reopens a locked period.
    pub async fn unlock_period(&self, partner: PartnerRef, year: PeriodYear) -> ResultEngine<()> {
        self.set_period_locked(partner, year, false).await
    }

    async fn set_period_locked(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        locked: bool,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            match find_period_model(&db_tx, partner, year).await? {
                None => Err(EngineError::KeyNotFound(format!(
                    "debt period {partner} {year}"
                ))),
                Some(model) => {
                    let active = debt_periods::ActiveModel {
                        id: ActiveValue::Set(model.id),
                        is_locked: ActiveValue::Set(locked),
                        updated_at: ActiveValue::Set(Utc::now()),
                        ..Default::default()
                    };
                    active.update(&db_tx).await?;
                    Ok(())
                }
            }
        })?;
        tracing::info!(%partner, %year, locked, "debt period lock changed");
        self.invalidate_views(partner);
        Ok(())
    }
}

//! Opening-balance strategies.
//!
//! - full: opening = net of every event strictly before the period.
//! - snapshot: opening = closing of the stored previous period, falling back
//!   to the full aggregation when that row does not exist.

use sea_orm::ConnectionTrait;

use crate::{Money, PartnerRef, PeriodYear, ResultEngine};

use super::{
    aggregate::{DateRange, period_totals},
    periods::find_period,
};

/// Opening balance derived from the whole history before `year`.
pub(super) async fn opening_from_history<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    year: PeriodYear,
) -> ResultEngine<Money> {
    let before = period_totals(db, partner, DateRange::before(year)).await?;
    Ok(before.net())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) struct SnapshotOpening {
    pub opening: Money,
    /// `true` when no previous period existed and history was re-aggregated.
    pub fell_back: bool,
}

/// Opening balance read from the previous period's closing balance.
pub(super) async fn opening_from_snapshot<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    year: PeriodYear,
) -> ResultEngine<SnapshotOpening> {
    let previous = match year.previous() {
        Ok(previous) => find_period(db, partner, previous).await?,
        Err(_) => None,
    };
    match previous {
        Some(previous) => Ok(SnapshotOpening {
            opening: previous.closing_balance,
            fell_back: false,
        }),
        None => Ok(SnapshotOpening {
            opening: opening_from_history(db, partner, year).await?,
            fell_back: true,
        }),
    }
}

//! Per-partner sync entry points.
//!
//! Each sync is one unit of work: source reads, period rows, the live
//! balance and the responsible-user assignment commit or roll back together.
//! Cached views are dropped only after a commit.

use chrono::Datelike;
use sea_orm::DatabaseTransaction;
use serde::{Deserialize, Serialize};

use crate::{DebtPeriod, EngineError, FALLBACK_NOTE, PartnerRef, PeriodYear, ResultEngine};

use super::{
    Engine,
    aggregate::{DateRange, first_activity_date, period_totals},
    partners::{assign_responsible, require_partner, write_current_balance},
    periods::{PeriodWrite, find_period, upsert_period},
    recurrence::{opening_from_history, opening_from_snapshot},
    with_tx, within,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStrategy {
    /// Replay every year from the partner's first activity.
    Full,
    /// Trust the previous year's stored closing balance.
    Snapshot,
}

impl SyncStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Snapshot => "snapshot",
        }
    }
}

/// Optional inputs of a sync.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOptions {
    /// Appended to the target period's notes.
    pub notes: Option<String>,
    /// New responsible user of the partner; a blank value clears it.
    pub assigned_user_id: Option<String>,
}

impl Engine {
    /// Recomputes `partner` from its first activity year through `year`,
    /// chaining each closing balance into the next opening balance.
    ///
    /// Locked intermediate years are kept as stored and their closing balance
    /// is carried forward. A locked `year` rejects the sync.
    pub async fn sync_full(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        tracing::debug!(%partner, %year, "full debt sync started");
        let period = within(
            self.config.full_timeout(),
            "full debt sync",
            self.sync_full_tx(partner, year, options),
        )
        .await?;
        self.invalidate_views(partner);
        tracing::debug!(%partner, %year, closing = %period.closing_balance, "full debt sync done");
        Ok(period)
    }

    /// Recomputes only `year`, opening from the stored previous period.
    pub async fn sync_snap(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        tracing::debug!(%partner, %year, "snapshot debt sync started");
        let period = within(
            self.config.snap_timeout(),
            "snapshot debt sync",
            self.sync_snap_tx(partner, year, options),
        )
        .await?;
        self.invalidate_views(partner);
        tracing::debug!(%partner, %year, closing = %period.closing_balance, "snapshot debt sync done");
        Ok(period)
    }

    pub async fn sync(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        strategy: SyncStrategy,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        match strategy {
            SyncStrategy::Full => self.sync_full(partner, year, options).await,
            SyncStrategy::Snapshot => self.sync_snap(partner, year, options).await,
        }
    }

    async fn sync_full_tx(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        with_tx!(self, |db_tx| {
            self.full_walk(&db_tx, partner, year, options).await
        })
    }

    async fn full_walk(
        &self,
        db_tx: &DatabaseTransaction,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        require_partner(db_tx, partner).await?;
        if let Some(user_id) = &options.assigned_user_id {
            assign_responsible(db_tx, partner, user_id).await?;
        }

        let first_year = match first_activity_date(db_tx, partner).await? {
            Some(first) => PeriodYear::new(first.year())?.min(year),
            None => year,
        };

        let mut opening = opening_from_history(db_tx, partner, first_year).await?;
        let mut last = None;
        for current in first_year.through(year) {
            if current != year
                && let Some(stored) = find_period(db_tx, partner, current).await?
                && stored.is_locked
            {
                tracing::debug!(%partner, year = %current, "locked period carried forward");
                opening = stored.closing_balance;
                continue;
            }

            let totals = period_totals(db_tx, partner, DateRange::year(current)).await?;
            let notes: Vec<&str> = if current == year {
                options.notes.as_deref().into_iter().collect()
            } else {
                Vec::new()
            };
            let period = upsert_period(
                db_tx,
                PeriodWrite {
                    partner,
                    year: current,
                    opening,
                    totals,
                    notes: &notes,
                },
            )
            .await?;
            opening = period.closing_balance;
            last = Some(period);
        }

        let period = last.ok_or_else(|| {
            EngineError::InvalidPeriod(format!("no period computed for {partner} {year}"))
        })?;
        if self.is_live_year(year) {
            write_current_balance(db_tx, partner, period.closing_balance).await?;
        }
        Ok(period)
    }

    async fn sync_snap_tx(
        &self,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        with_tx!(self, |db_tx| {
            self.snapshot_step(&db_tx, partner, year, options).await
        })
    }

    async fn snapshot_step(
        &self,
        db_tx: &DatabaseTransaction,
        partner: PartnerRef,
        year: PeriodYear,
        options: &SyncOptions,
    ) -> ResultEngine<DebtPeriod> {
        require_partner(db_tx, partner).await?;
        if let Some(user_id) = &options.assigned_user_id {
            assign_responsible(db_tx, partner, user_id).await?;
        }

        let snapshot = opening_from_snapshot(db_tx, partner, year).await?;
        if snapshot.fell_back {
            tracing::debug!(%partner, %year, "no previous period, opening from full history");
        }
        let totals = period_totals(db_tx, partner, DateRange::year(year)).await?;

        let mut notes: Vec<&str> = Vec::with_capacity(2);
        if snapshot.fell_back {
            notes.push(FALLBACK_NOTE);
        }
        if let Some(note) = options.notes.as_deref() {
            notes.push(note);
        }

        let period = upsert_period(
            db_tx,
            PeriodWrite {
                partner,
                year,
                opening: snapshot.opening,
                totals,
                notes: &notes,
            },
        )
        .await?;
        if self.is_live_year(year) {
            write_current_balance(db_tx, partner, period.closing_balance).await?;
        }
        Ok(period)
    }
}

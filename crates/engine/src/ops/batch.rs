//! Year-wide sync over every active partner.
//!
//! Partners are processed one after the other, never concurrently.

use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::{PartnerRef, PeriodYear, ResultEngine};

use super::{Engine, SyncOptions, SyncStrategy, aggregate::active_partners};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub partner: PartnerRef,
    pub message: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub year: PeriodYear,
    pub strategy: SyncStrategy,
    pub total_checked: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub elapsed_ms: u64,
    pub failures: Vec<BatchFailure>,
}

impl Engine {
    /// Full-history sync of every partner active in `year`.
    pub async fn sync_full_all(&self, year: PeriodYear) -> ResultEngine<BatchSummary> {
        self.sync_all(year, SyncStrategy::Full).await
    }

    /// Snapshot sync of every partner active in `year`.
    pub async fn sync_snap_all(&self, year: PeriodYear) -> ResultEngine<BatchSummary> {
        self.sync_all(year, SyncStrategy::Snapshot).await
    }

    /// Runs `strategy` for each active partner. A failing partner is recorded
    /// and skipped; only failing to list the partners aborts the batch.
    pub async fn sync_all(
        &self,
        year: PeriodYear,
        strategy: SyncStrategy,
    ) -> ResultEngine<BatchSummary> {
        let started = Instant::now();
        let partners = active_partners(&self.database, year).await?;
        tracing::info!(
            %year,
            strategy = strategy.as_str(),
            partners = partners.len(),
            "debt batch sync started"
        );

        let options = SyncOptions::default();
        let mut success_count = 0;
        let mut failures = Vec::new();
        for partner in &partners {
            match self.sync(*partner, year, strategy, &options).await {
                Ok(_) => success_count += 1,
                Err(err) => {
                    tracing::warn!(%partner, %year, "debt sync failed: {err}");
                    failures.push(BatchFailure {
                        partner: *partner,
                        message: err.to_string(),
                    });
                }
            }
        }

        let summary = BatchSummary {
            year,
            strategy,
            total_checked: partners.len(),
            success_count,
            failure_count: failures.len(),
            elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            failures,
        };
        tracing::info!(
            %year,
            strategy = strategy.as_str(),
            succeeded = summary.success_count,
            failed = summary.failure_count,
            elapsed_ms = summary.elapsed_ms,
            "debt batch sync finished"
        );
        Ok(summary)
    }
}

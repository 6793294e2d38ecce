//! Integrity audit of the period ledger.
//!
//! Read-only. Findings are returned as data; nothing is repaired here (the
//! usual remedy is a full sync of the affected partner).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{DebtPeriod, EngineError, PartnerRef, PeriodYear, ResultEngine};

use super::{Engine, aggregate::active_partners, periods::periods_for_year, with_tx};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Medium,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefectKind {
    /// Stored closing balance disagrees with the row's own components.
    Arithmetic,
    /// Opening balance disagrees with the previous year's closing balance.
    Continuity,
    /// Active partner without a period row.
    MissingPeriod,
}

impl DefectKind {
    pub fn severity(self) -> Severity {
        match self {
            Self::Arithmetic => Severity::Critical,
            Self::Continuity => Severity::High,
            Self::MissingPeriod => Severity::Medium,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityDefect {
    pub kind: DefectKind,
    pub partner: PartnerRef,
    pub reason: String,
    pub severity: Severity,
}

impl IntegrityDefect {
    fn new(kind: DefectKind, partner: PartnerRef, reason: String) -> Self {
        Self {
            kind,
            partner,
            reason,
            severity: kind.severity(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub year: PeriodYear,
    pub total_checked: usize,
    pub total_defects: usize,
    pub defects: Vec<IntegrityDefect>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.defects.is_empty()
    }
}

impl Engine {
    /// Checks the `year` ledger for arithmetic drift, drift against
    /// `year - 1`, and active partners without a row.
    pub async fn check_integrity(&self, year: PeriodYear) -> ResultEngine<IntegrityReport> {
        let (current, previous, active) = with_tx!(self, |db_tx| {
            let current = periods_for_year(&db_tx, year).await?;
            let previous = match year.previous() {
                Ok(previous) => periods_for_year(&db_tx, previous).await?,
                Err(_) => Vec::new(),
            };
            let active = active_partners(&db_tx, year).await?;
            Ok::<_, EngineError>((current, previous, active))
        })?;

        let defects = self.find_defects(&current, &previous, &active);
        if !defects.is_empty() {
            tracing::warn!(%year, defects = defects.len(), "debt ledger integrity defects found");
        }
        Ok(IntegrityReport {
            year,
            total_checked: current.len(),
            total_defects: defects.len(),
            defects,
        })
    }

    fn find_defects(
        &self,
        current: &[DebtPeriod],
        previous: &[DebtPeriod],
        active: &[PartnerRef],
    ) -> Vec<IntegrityDefect> {
        let tolerance = self.config.tolerance;
        let previous_by_partner: HashMap<PartnerRef, &DebtPeriod> =
            previous.iter().map(|p| (p.partner, p)).collect();

        let mut defects = Vec::new();
        for period in current {
            let expected = period.expected_closing();
            if !period.closing_balance.within(expected, tolerance) {
                defects.push(IntegrityDefect::new(
                    DefectKind::Arithmetic,
                    period.partner,
                    format!(
                        "{}: closing balance {} but opening + increase - decreases = {}",
                        period.year, period.closing_balance, expected
                    ),
                ));
            }

            if let Some(prior) = previous_by_partner.get(&period.partner)
                && !period.opening_balance.within(prior.closing_balance, tolerance)
            {
                defects.push(IntegrityDefect::new(
                    DefectKind::Continuity,
                    period.partner,
                    format!(
                        "{}: opening balance {} but {} closed at {}",
                        period.year, period.opening_balance, prior.year, prior.closing_balance
                    ),
                ));
            }
        }

        let present: HashSet<PartnerRef> = current.iter().map(|p| p.partner).collect();
        for partner in active {
            if !present.contains(partner) {
                defects.push(IntegrityDefect::new(
                    DefectKind::MissingPeriod,
                    *partner,
                    "has activity in the year but no debt period".to_string(),
                ));
            }
        }
        defects
    }
}

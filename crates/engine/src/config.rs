//! Ledger tunables.

use std::time::Duration;

use serde::Deserialize;

use crate::Money;

/// Runtime configuration of the debt ledger.
///
/// Every field has a default, so an empty `[ledger]` section is valid.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum drift (minor units) accepted by the integrity audit.
    pub tolerance: Money,
    /// Balances at or below this amount count as paid.
    pub paid_threshold: Money,
    pub snap_timeout_secs: u64,
    pub full_timeout_secs: u64,
    pub cache_ttl_secs: u64,
    pub max_page_size: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            tolerance: Money::from_units(10),
            paid_threshold: Money::from_units(10),
            snap_timeout_secs: 5,
            full_timeout_secs: 30,
            cache_ttl_secs: 300,
            max_page_size: 100,
        }
    }
}

impl LedgerConfig {
    pub fn snap_timeout(&self) -> Duration {
        Duration::from_secs(self.snap_timeout_secs)
    }

    pub fn full_timeout(&self) -> Duration {
        Duration::from_secs(self.full_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

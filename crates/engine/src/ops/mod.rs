use std::{fmt, future::Future, sync::Arc, time::Duration};

use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::DatabaseConnection;

use crate::{
    EngineError, LedgerConfig, LogNotifier, MemoryCache, Notifier, PartnerRef, PeriodYear,
    ResultEngine, ViewCache,
};

mod aggregate;
mod audit;
mod batch;
mod notify;
mod partners;
mod periods;
mod recurrence;
mod sync;
mod views;

pub use aggregate::EventKind;
pub use audit::{DefectKind, IntegrityDefect, IntegrityReport, Severity};
pub use batch::{BatchFailure, BatchSummary};
pub use sync::{SyncOptions, SyncStrategy};
pub use views::{DebtDetail, DebtListFilter, DebtListItem, DebtListPage, DebtSummary, HistoryLine};

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = sea_orm::TransactionTrait::begin(&$self.database).await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

/// Bounds a unit of work in time. Dropping the future drops its open
/// transaction, which rolls it back.
async fn within<T>(
    timeout: Duration,
    what: &str,
    work: impl Future<Output = ResultEngine<T>>,
) -> ResultEngine<T> {
    match tokio::time::timeout(timeout, work).await {
        Ok(result) => result,
        Err(_) => Err(EngineError::Timeout(format!(
            "{what} exceeded {}s",
            timeout.as_secs()
        ))),
    }
}

const LIST_CACHE_PREFIX: &str = "debt:list:";

fn detail_cache_prefix(partner: PartnerRef) -> String {
    format!("debt:detail:{}:{}:", partner.kind(), partner.id())
}

pub struct Engine {
    database: DatabaseConnection,
    config: LedgerConfig,
    cache: Arc<dyn ViewCache>,
    notifier: Arc<dyn Notifier>,
    today: Option<NaiveDate>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    /// Today's date, as seen by the write path.
    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    pub(crate) fn current_year(&self) -> i32 {
        self.today().year()
    }

    /// Whether a sync of `year` may refresh the partner's live balance.
    pub(crate) fn is_live_year(&self, year: PeriodYear) -> bool {
        year.value() >= self.current_year()
    }

    /// Drops every cached view that can show `partner`.
    pub(crate) fn invalidate_views(&self, partner: PartnerRef) {
        self.cache.invalidate_prefix(LIST_CACHE_PREFIX);
        self.cache.invalidate_prefix(&detail_cache_prefix(partner));
    }
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("database", &self.database)
            .field("config", &self.config)
            .field("today", &self.today)
            .finish_non_exhaustive()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    config: LedgerConfig,
    cache: Option<Arc<dyn ViewCache>>,
    notifier: Option<Arc<dyn Notifier>>,
    today: Option<NaiveDate>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    pub fn config(mut self, config: LedgerConfig) -> EngineBuilder {
        self.config = config;
        self
    }

    /// Cache for list/detail views. Defaults to an in-process [`MemoryCache`].
    pub fn cache(mut self, cache: Arc<dyn ViewCache>) -> EngineBuilder {
        self.cache = Some(cache);
        self
    }

    /// Notification delivery. Defaults to [`LogNotifier`].
    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> EngineBuilder {
        self.notifier = Some(notifier);
        self
    }

    /// Pins "today" instead of reading the system clock.
    pub fn today(mut self, today: NaiveDate) -> EngineBuilder {
        self.today = Some(today);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        if self.config.max_page_size == 0 {
            return Err(EngineError::InvalidFilter(
                "max_page_size must be > 0".to_string(),
            ));
        }
        if self.config.tolerance.is_negative() {
            return Err(EngineError::InvalidAmount(
                "tolerance must be >= 0".to_string(),
            ));
        }
        Ok(Engine {
            database: self.database,
            config: self.config,
            cache: self
                .cache
                .unwrap_or_else(|| Arc::new(MemoryCache::new())),
            notifier: self.notifier.unwrap_or_else(|| Arc::new(LogNotifier)),
            today: self.today,
        })
    }
}

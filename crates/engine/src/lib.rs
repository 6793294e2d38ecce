//! Debt ledger engine.
//!
//! Derives, per partner and per year, an authoritative debt balance from the
//! raw order and payment records, persists it as a period row and chains
//! periods so each year opens where the previous one closed.

pub use cache::{MemoryCache, ViewCache};
pub use config::LedgerConfig;
pub use debt_adjustments::AdjustmentKind;
pub use debt_periods::{DebtPeriod, DebtStatus, FALLBACK_NOTE, PeriodTotals, closing_balance};
pub use error::EngineError;
pub use money::Money;
pub use notify::{LogNotifier, NoticeKind, Notification, NotificationOutcome, Notifier};
pub use ops::{
    BatchFailure, BatchSummary, DebtDetail, DebtListFilter, DebtListItem, DebtListPage,
    DebtSummary, DefectKind, Engine, EngineBuilder, EventKind, HistoryLine, IntegrityDefect,
    IntegrityReport, Severity, SyncOptions, SyncStrategy,
};
pub use partner::{Partner, PartnerKind, PartnerRef};
pub use period::PeriodYear;

mod cache;
mod config;
mod customers;
mod debt_adjustments;
mod debt_periods;
mod error;
mod money;
mod notify;
mod ops;
mod partner;
mod payment_receipts;
mod payment_vouchers;
mod period;
mod purchase_orders;
mod sales_orders;
mod suppliers;
mod util;

type ResultEngine<T> = Result<T, EngineError>;

//! The module contains the errors the ledger engine can return.
//!
//! Data-quality problems found by the integrity audit are **not** errors:
//! they are reported as [`IntegrityDefect`] values.
//!
//! The errors are:
//!
//! - [`KeyNotFound`] returned when a partner or a period does not exist.
//! - [`InvalidPartner`] / [`InvalidPeriod`] / [`InvalidFilter`] returned for
//!   malformed input, before any source data is read.
//! - [`PeriodLocked`] returned when a sync would overwrite a closed period.
//! - [`Timeout`] returned when a unit of work runs past its configured timeout; the
//!   whole unit of work is rolled back.
//!
//!  [`KeyNotFound`]: EngineError::KeyNotFound
//!  [`InvalidPartner`]: EngineError::InvalidPartner
//!  [`InvalidPeriod`]: EngineError::InvalidPeriod
//!  [`InvalidFilter`]: EngineError::InvalidFilter
//!  [`PeriodLocked`]: EngineError::PeriodLocked
//!  [`Timeout`]: EngineError::Timeout
//!  [`IntegrityDefect`]: crate::IntegrityDefect
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Invalid partner: {0}")]
    InvalidPartner(String),
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Period locked: {0}")]
    PeriodLocked(String),
    #[error("Timed out: {0}")]
    Timeout(String),
    #[error("Notification failed: {0}")]
    Notification(String),
    #[error("Serialization failed: {0}")]
    Serialization(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InvalidPartner(a), Self::InvalidPartner(b)) => a == b,
            (Self::InvalidPeriod(a), Self::InvalidPeriod(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::PeriodLocked(a), Self::PeriodLocked(b)) => a == b,
            (Self::Timeout(a), Self::Timeout(b)) => a == b,
            (Self::Notification(a), Self::Notification(b)) => a == b,
            (Self::Serialization(a), Self::Serialization(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

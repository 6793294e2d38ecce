//! Notification dispatch contract.
//!
//! The engine decides whether a partner is notified and with which numbers;
//! delivery belongs to the [`Notifier`] implementation.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{PartnerRef, PeriodYear, ResultEngine};

/// A message ready to be delivered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub partner: PartnerRef,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Delivers notifications (email, chat, ...).
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: &Notification) -> ResultEngine<()>;
}

/// Which notice to send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NoticeKind {
    /// Reminder of the partner's current (denormalized) balance.
    BalanceReminder,
    /// Reconciliation of one stored period.
    PeriodReconciliation { year: PeriodYear },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent { to: String },
    Skipped { reason: String },
}

/// Notifier that only records messages in the log.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> ResultEngine<()> {
        tracing::info!(
            partner = %notification.partner,
            to = %notification.to,
            subject = %notification.subject,
            "notification dispatched"
        );
        Ok(())
    }
}

use crate::{
    DebtStatus, EngineError, Money, NoticeKind, Notification, NotificationOutcome, Partner,
    PartnerKind, PartnerRef, ResultEngine, util::normalize_optional_text,
};

use super::{Engine, partners::require_partner, periods::find_period};

/// Whole units, rounded up, with thousands separators (e.g. `400,001.00`).
fn presentable(amount: Money) -> String {
    Money::from_units(amount.ceil_units()).to_string()
}

fn balance_reminder(partner: &Partner, to: String) -> Notification {
    let amount = presentable(partner.current_balance);
    let (subject, body) = match partner.partner.kind() {
        PartnerKind::Customer => (
            format!("Outstanding balance for {}", partner.name),
            format!(
                "Dear {},\n\nyour outstanding balance with us is {amount}.\n\
                 Please settle it at your earliest convenience.",
                partner.name
            ),
        ),
        PartnerKind::Supplier => (
            format!("Payable balance for {}", partner.name),
            format!(
                "Dear {},\n\nour records show a payable balance of {amount} in your favour.",
                partner.name
            ),
        ),
    };
    Notification {
        partner: partner.partner,
        to,
        subject,
        body,
    }
}

impl Engine {
    /// Decides whether `partner` gets the `kind` notice and dispatches it
    /// through the configured notifier.
    ///
    /// Missing contact addresses, settled balances and unsynced periods are
    /// reported as [`NotificationOutcome::Skipped`], not as errors.
    pub async fn notify_partner(
        &self,
        partner: PartnerRef,
        kind: NoticeKind,
    ) -> ResultEngine<NotificationOutcome> {
        let info = require_partner(&self.database, partner).await?;
        let Some(to) = normalize_optional_text(info.email.as_deref()) else {
            return Ok(skipped(partner, "no contact address"));
        };

        let notification = match kind {
            NoticeKind::BalanceReminder => {
                if DebtStatus::of(info.current_balance, self.config.paid_threshold)
                    == DebtStatus::Paid
                {
                    return Ok(skipped(partner, "balance already settled"));
                }
                balance_reminder(&info, to.clone())
            }
            NoticeKind::PeriodReconciliation { year } => {
                let Some(period) = find_period(&self.database, partner, year).await? else {
                    return Ok(skipped(partner, &format!("no debt period for {year}")));
                };
                Notification {
                    partner,
                    to: to.clone(),
                    subject: format!("Debt reconciliation {year} - {}", info.name),
                    body: format!(
                        "Dear {},\n\nplease confirm the {year} balance ({} to {}):\n\
                         opening balance: {}\n\
                         increase: {}\n\
                         decrease: {}\n\
                         returns and adjustments: {}\n\
                         closing balance: {}",
                        info.name,
                        period.start_time.date_naive(),
                        period.end_time.date_naive(),
                        presentable(period.opening_balance),
                        presentable(period.increasing_amount),
                        presentable(period.decreasing_amount),
                        presentable(period.return_amount + period.adjustment_amount),
                        presentable(period.closing_balance),
                    ),
                }
            }
        };

        self.notifier
            .send(&notification)
            .await
            .map_err(|err| EngineError::Notification(format!("{partner}: {err}")))?;
        tracing::info!(%partner, to = %to, "debt notice sent");
        Ok(NotificationOutcome::Sent { to })
    }
}

fn skipped(partner: PartnerRef, reason: &str) -> NotificationOutcome {
    tracing::debug!(%partner, reason, "debt notice skipped");
    NotificationOutcome::Skipped {
        reason: reason.to_string(),
    }
}

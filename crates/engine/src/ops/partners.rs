use chrono::Utc;
use sea_orm::{ActiveValue, ConnectionTrait, prelude::*};

use crate::{
    EngineError, Money, Partner, PartnerRef, ResultEngine, customers, suppliers,
    util::normalize_optional_text,
};

use super::Engine;

pub(super) async fn find_partner<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
) -> ResultEngine<Option<Partner>> {
    let id = partner.id().to_string();
    match partner {
        PartnerRef::Customer(_) => customers::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Partner::try_from)
            .transpose(),
        PartnerRef::Supplier(_) => suppliers::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(Partner::try_from)
            .transpose(),
    }
}

pub(super) async fn require_partner<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
) -> ResultEngine<Partner> {
    find_partner(db, partner)
        .await?
        .ok_or_else(|| EngineError::KeyNotFound(format!("{} not exists", partner.kind())))
}

/// Sets (or clears, with a blank value) the responsible user of a partner.
pub(super) async fn assign_responsible<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    user_id: &str,
) -> ResultEngine<()> {
    let user_id = normalize_optional_text(Some(user_id));
    let id = partner.id().to_string();
    match partner {
        PartnerRef::Customer(_) => {
            customers::ActiveModel {
                id: ActiveValue::Set(id),
                assigned_user_id: ActiveValue::Set(user_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        PartnerRef::Supplier(_) => {
            suppliers::ActiveModel {
                id: ActiveValue::Set(id),
                assigned_user_id: ActiveValue::Set(user_id),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
    }
    Ok(())
}

/// Writes the denormalized live balance (`current_debt` / `total_payable`).
pub(super) async fn write_current_balance<C: ConnectionTrait>(
    db: &C,
    partner: PartnerRef,
    balance: Money,
) -> ResultEngine<()> {
    let id = partner.id().to_string();
    let now = Utc::now();
    match partner {
        PartnerRef::Customer(_) => {
            customers::ActiveModel {
                id: ActiveValue::Set(id),
                current_debt: ActiveValue::Set(balance.minor()),
                debt_updated_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
        PartnerRef::Supplier(_) => {
            suppliers::ActiveModel {
                id: ActiveValue::Set(id),
                total_payable: ActiveValue::Set(balance.minor()),
                payable_updated_at: ActiveValue::Set(Some(now)),
                ..Default::default()
            }
            .update(db)
            .await?;
        }
    }
    Ok(())
}

impl Engine {
    /// Return partner master data.
    pub async fn partner(&self, partner: PartnerRef) -> ResultEngine<Partner> {
        require_partner(&self.database, partner).await
    }
}

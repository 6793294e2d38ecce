//! Returns and manual adjustments.
//!
//! Both reduce a partner's balance in the period they occur in, next to
//! payments.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::EngineError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdjustmentKind {
    Return,
    Adjustment,
}

impl AdjustmentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Return => "return",
            Self::Adjustment => "adjustment",
        }
    }
}

impl TryFrom<&str> for AdjustmentKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "return" => Ok(Self::Return),
            "adjustment" => Ok(Self::Adjustment),
            other => Err(EngineError::InvalidAmount(format!(
                "invalid adjustment kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "debt_adjustments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub partner_kind: String,
    pub partner_id: String,
    pub kind: String,
    pub amount: i64,
    pub occurred_at: DateTimeUtc,
    pub note: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

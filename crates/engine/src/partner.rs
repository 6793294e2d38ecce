//! Partner identities.
//!
//! A ledger line belongs to exactly one partner: a customer (who owes us) or
//! a supplier (who we owe). [`PartnerRef`] makes the "both" and "neither"
//! states unrepresentable.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, Money};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerKind {
    Customer,
    Supplier,
}

impl PartnerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Customer => "customer",
            Self::Supplier => "supplier",
        }
    }
}

impl TryFrom<&str> for PartnerKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "customer" => Ok(Self::Customer),
            "supplier" => Ok(Self::Supplier),
            other => Err(EngineError::InvalidPartner(format!(
                "invalid partner kind: {other}"
            ))),
        }
    }
}

impl fmt::Display for PartnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a business partner owning a debt ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum PartnerRef {
    Customer(Uuid),
    Supplier(Uuid),
}

impl PartnerRef {
    pub fn new(kind: PartnerKind, id: Uuid) -> Self {
        match kind {
            PartnerKind::Customer => Self::Customer(id),
            PartnerKind::Supplier => Self::Supplier(id),
        }
    }

    /// Builds a reference from the two optional role identifiers used by
    /// request handlers. Exactly one of them must be set.
    pub fn from_optional(
        customer_id: Option<Uuid>,
        supplier_id: Option<Uuid>,
    ) -> Result<Self, EngineError> {
        match (customer_id, supplier_id) {
            (Some(id), None) => Ok(Self::Customer(id)),
            (None, Some(id)) => Ok(Self::Supplier(id)),
            (Some(_), Some(_)) => Err(EngineError::InvalidPartner(
                "customer_id and supplier_id are mutually exclusive".to_string(),
            )),
            (None, None) => Err(EngineError::InvalidPartner(
                "one of customer_id or supplier_id is required".to_string(),
            )),
        }
    }

    pub fn kind(self) -> PartnerKind {
        match self {
            Self::Customer(_) => PartnerKind::Customer,
            Self::Supplier(_) => PartnerKind::Supplier,
        }
    }

    pub fn id(self) -> Uuid {
        match self {
            Self::Customer(id) | Self::Supplier(id) => id,
        }
    }

    pub(crate) fn parse_stored(kind: &str, id: &str) -> Result<Self, EngineError> {
        let kind = PartnerKind::try_from(kind)?;
        let id = Uuid::parse_str(id)
            .map_err(|_| EngineError::InvalidPartner(format!("invalid {kind} id: {id}")))?;
        Ok(Self::new(kind, id))
    }
}

impl fmt::Display for PartnerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.id())
    }
}

impl FromStr for PartnerRef {
    type Err = EngineError;

    /// Parses `customer:<uuid>` or `supplier:<uuid>`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, id) = s.trim().split_once(':').ok_or_else(|| {
            EngineError::InvalidPartner(format!("expected <kind>:<id>, got {s}"))
        })?;
        Self::parse_stored(kind, id)
    }
}

/// Partner master data as seen by the ledger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub partner: PartnerRef,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    /// Denormalized balance (`current_debt` for customers, `total_payable`
    /// for suppliers). Only trustworthy for the current year onward.
    pub current_balance: Money,
    pub balance_updated_at: Option<DateTime<Utc>>,
    pub assigned_user_id: Option<String>,
}

//! Supplier master data (partner directory, supplier side).

use sea_orm::entity::prelude::*;

use crate::{EngineError, Money, Partner, PartnerRef, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub total_payable: i64,
    pub payable_updated_at: Option<DateTimeUtc>,
    pub assigned_user_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Partner {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            partner: PartnerRef::Supplier(parse_uuid(&model.id, "supplier")?),
            code: model.code,
            name: model.name,
            email: model.email,
            phone: model.phone,
            current_balance: Money::new(model.total_payable),
            balance_updated_at: model.payable_updated_at,
            assigned_user_id: model.assigned_user_id,
        })
    }
}

//! Customer master data (partner directory, customer side).

use sea_orm::entity::prelude::*;

use crate::{EngineError, Money, Partner, PartnerRef, util::parse_uuid};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "customers")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub code: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub current_debt: i64,
    pub debt_updated_at: Option<DateTimeUtc>,
    pub assigned_user_id: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl TryFrom<Model> for Partner {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            partner: PartnerRef::Customer(parse_uuid(&model.id, "customer")?),
            code: model.code,
            name: model.name,
            email: model.email,
            phone: model.phone,
            current_balance: Money::new(model.current_debt),
            balance_updated_at: model.debt_updated_at,
            assigned_user_id: model.assigned_user_id,
        })
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A paid, time-boxed promotion of a seller's products. `ends_at` is derived
/// from the plan at creation and never changes.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boosts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub seller_id: Uuid,
    pub transaction_id: String,
    pub plan_days: i32,
    pub price: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::boost_product::Entity")]
    BoostProducts,
}

impl Related<super::boost_product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BoostProducts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

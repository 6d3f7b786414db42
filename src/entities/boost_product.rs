use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Join row tying a boosted product to its boost.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "boost_products")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub boost_id: Uuid,
    pub product_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::boost::Entity",
        from = "Column::BoostId",
        to = "super::boost::Column::Id"
    )]
    Boost,
}

impl Related<super::boost::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Boost.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

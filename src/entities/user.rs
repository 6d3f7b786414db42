use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Marketplace account. Every user can both buy and sell; the seller-side
/// aggregates (`balance`, `total_sold`) are cached rollups of paid,
/// non-canceled orders.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[sea_orm(nullable)]
    pub phone: Option<String>,
    pub phone_verified: bool,
    pub blocked: bool,
    /// Cumulative net proceeds from sales.
    pub balance: Decimal,
    /// Count of completed sales.
    pub total_sold: i32,
    // Seller pickup address; shipment creation is skipped when absent.
    #[sea_orm(nullable)]
    pub pickup_line: Option<String>,
    #[sea_orm(nullable)]
    pub pickup_city: Option<String>,
    #[sea_orm(nullable)]
    pub pickup_state: Option<String>,
    #[sea_orm(nullable)]
    pub pickup_postal_code: Option<String>,
    #[sea_orm(nullable)]
    pub pickup_country: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
    #[sea_orm(has_many = "super::address::Entity")]
    Addresses,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// A seller has a usable pickup address only when every field is present.
    pub fn pickup_address(&self) -> Option<PickupAddress> {
        Some(PickupAddress {
            line: self.pickup_line.clone()?,
            city: self.pickup_city.clone()?,
            state: self.pickup_state.clone()?,
            postal_code: self.pickup_postal_code.clone()?,
            country: self.pickup_country.clone()?,
        })
    }
}

/// Fully-resolved seller pickup address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupAddress {
    pub line: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

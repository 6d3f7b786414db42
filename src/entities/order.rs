use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One buyer–seller–product purchase record within a checkout batch. All
/// orders from one checkout share a gateway `transaction_id`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub buyer_id: Uuid,
    pub seller_id: Uuid,
    pub product_id: Uuid,
    pub address_id: Uuid,
    pub transaction_id: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub delivery_status: DeliveryStatus,
    /// Accepted at intake but never branched on (prepaid vs. COD is decided
    /// by the gateway flow).
    #[sea_orm(nullable)]
    pub payment_mode: Option<String>,
    // Carrier identifiers, populated by fulfillment dispatch. All null when
    // the seller had no pickup address at settlement time.
    #[sea_orm(nullable)]
    pub shipment_id: Option<String>,
    #[sea_orm(nullable)]
    pub awb_code: Option<String>,
    #[sea_orm(nullable)]
    pub tracking_url: Option<String>,
    #[sea_orm(nullable)]
    pub label_url: Option<String>,
    #[sea_orm(nullable)]
    pub shipment_status: Option<String>,
    pub created_at: DateTime<Utc>,
    #[sea_orm(nullable)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::address::Entity",
        from = "Column::AddressId",
        to = "super::address::Column::Id"
    )]
    Address,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Address.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Settlement state of the order's payment. Moves `pending → paid` exactly
/// once, or to `canceled` on refund.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "paid")]
    Paid,
    #[sea_orm(string_value = "canceled")]
    Canceled,
}

/// Delivery state machine:
/// `pending → {shipped, rejected, cancelled}`, `shipped → delivered`.
/// `delivered` and `cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "shipped")]
    Shipped,
    #[sea_orm(string_value = "delivered")]
    Delivered,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl DeliveryStatus {
    /// Legal edges of the delivery state machine.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Pending, Shipped) | (Pending, Rejected) | (Pending, Cancelled) | (Shipped, Delivered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DeliveryStatus::Delivered | DeliveryStatus::Cancelled)
    }

    /// Buyer-initiated cancellation is only reachable before shipping.
    pub fn is_cancelable(self) -> bool {
        matches!(self, DeliveryStatus::Pending | DeliveryStatus::Rejected)
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DeliveryStatus::Pending => "pending",
            DeliveryStatus::Shipped => "shipped",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Rejected => "rejected",
            DeliveryStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::DeliveryStatus::*;

    #[test]
    fn transition_table_matches_state_machine() {
        assert!(Pending.can_transition_to(Shipped));
        assert!(Pending.can_transition_to(Rejected));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));

        assert!(!Pending.can_transition_to(Delivered));
        assert!(!Shipped.can_transition_to(Cancelled));
        assert!(!Shipped.can_transition_to(Pending));
        for next in [Pending, Shipped, Delivered, Rejected, Cancelled] {
            assert!(!Delivered.can_transition_to(next));
            assert!(!Cancelled.can_transition_to(next));
        }
    }

    #[test]
    fn cancelable_only_before_shipping() {
        assert!(Pending.is_cancelable());
        assert!(Rejected.is_cancelable());
        assert!(!Shipped.is_cancelable());
        assert!(!Delivered.is_cancelable());
        assert!(!Cancelled.is_cancelable());
    }

    #[test]
    fn terminal_states() {
        assert!(Delivered.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
        assert!(!Shipped.is_terminal());
        assert!(!Rejected.is_terminal());
    }
}

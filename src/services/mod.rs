use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::EventSender;
use crate::gateways::{EmailSender, PaymentGateway, ShippingAggregator};

pub mod boosts;
pub mod cancellation;
pub mod carts;
pub mod coupons;
pub mod notifications;
pub mod orders;
pub mod settlement;

pub use boosts::BoostService;
pub use cancellation::CancellationService;
pub use carts::CartService;
pub use coupons::CouponService;
pub use notifications::NotificationService;
pub use orders::OrderService;
pub use settlement::SettlementService;

/// External integrations behind trait objects so tests can swap in mocks.
#[derive(Clone)]
pub struct GatewaySet {
    pub payment: Arc<dyn PaymentGateway>,
    pub shipping: Arc<dyn ShippingAggregator>,
    pub email: Arc<dyn EmailSender>,
}

/// All services, constructed once at startup and shared via `AppState`.
#[derive(Clone)]
pub struct AppServices {
    pub orders: Arc<OrderService>,
    pub settlements: Arc<SettlementService>,
    pub cancellations: Arc<CancellationService>,
    pub boosts: Arc<BoostService>,
    pub coupons: Arc<CouponService>,
    pub carts: Arc<CartService>,
    pub notifications: Arc<NotificationService>,
}

impl AppServices {
    pub fn new(
        db: Arc<sea_orm::DatabaseConnection>,
        config: Arc<AppConfig>,
        gateways: GatewaySet,
        event_sender: EventSender,
    ) -> Self {
        let notifications = Arc::new(NotificationService::new(
            db.clone(),
            gateways.email.clone(),
        ));
        let coupons = Arc::new(CouponService::new(db.clone(), event_sender.clone()));
        let carts = Arc::new(CartService::new(
            db.clone(),
            notifications.clone(),
            config.cart_reminder_days,
        ));
        let orders = Arc::new(OrderService::new(
            db.clone(),
            gateways.payment.clone(),
            gateways.shipping.clone(),
            event_sender.clone(),
        ));
        let settlements = Arc::new(SettlementService::new(
            db.clone(),
            gateways.payment.clone(),
            gateways.shipping.clone(),
            coupons.clone(),
            carts.clone(),
            notifications.clone(),
            event_sender.clone(),
            config.clone(),
        ));
        let cancellations = Arc::new(CancellationService::new(
            db.clone(),
            gateways.payment.clone(),
            gateways.shipping.clone(),
            notifications.clone(),
            event_sender.clone(),
        ));
        let boosts = Arc::new(BoostService::new(
            db,
            gateways.payment,
            notifications.clone(),
            event_sender,
        ));
        Self {
            orders,
            settlements,
            cancellations,
            boosts,
            coupons,
            carts,
            notifications,
        }
    }
}

/// Converts a major-unit amount to the gateway's minor currency unit (×100).
pub fn to_minor_units(amount: Decimal) -> Result<i64, ServiceError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or_else(|| ServiceError::ValidationError("Amount out of range".to_string()))
}

/// Gateway transaction ids are opaque strings with a flow prefix.
pub fn new_transaction_id(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4().simple())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn minor_units_are_hundredths() {
        assert_eq!(to_minor_units(dec!(499.50)).unwrap(), 49950);
        assert_eq!(to_minor_units(dec!(0.01)).unwrap(), 1);
        assert_eq!(to_minor_units(dec!(1200)).unwrap(), 120000);
    }

    #[test]
    fn transaction_ids_carry_prefix_and_differ() {
        let a = new_transaction_id("TXN");
        let b = new_transaction_id("TXN");
        assert!(a.starts_with("TXN-"));
        assert_ne!(a, b);
    }
}

use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::entities::order::{self, PaymentStatus};
use crate::entities::settlement::{self, SettlementKind};
use crate::entities::{address, product, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::{PaymentGateway, SettlementStatus, ShipmentRequest, ShippingAggregator};

use super::{to_minor_units, CartService, CouponService, NotificationService};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    Completed,
    Pending,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub status: VerificationStatus,
    /// True when this transaction had been settled by an earlier call; no
    /// side effects were applied again.
    pub already_settled: bool,
    pub order_ids: Vec<Uuid>,
}

/// Confirms gateway payments and applies the post-purchase effects exactly
/// once per transaction id.
pub struct SettlementService {
    db: Arc<DatabaseConnection>,
    payment: Arc<dyn PaymentGateway>,
    shipping: Arc<dyn ShippingAggregator>,
    coupons: Arc<CouponService>,
    carts: Arc<CartService>,
    notifications: Arc<NotificationService>,
    event_sender: EventSender,
    config: Arc<AppConfig>,
}

impl SettlementService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        db: Arc<DatabaseConnection>,
        payment: Arc<dyn PaymentGateway>,
        shipping: Arc<dyn ShippingAggregator>,
        coupons: Arc<CouponService>,
        carts: Arc<CartService>,
        notifications: Arc<NotificationService>,
        event_sender: EventSender,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            db,
            payment,
            shipping,
            coupons,
            carts,
            notifications,
            event_sender,
            config,
        }
    }

    /// Verifies a checkout payment against the gateway and, when completed,
    /// applies all settlement effects in one database transaction guarded by
    /// the settlements table. Called from the gateway redirect, so it must
    /// tolerate retries and double submissions.
    #[instrument(skip(self))]
    pub async fn verify_order_payment(
        &self,
        transaction_id: &str,
    ) -> Result<VerificationOutcome, ServiceError> {
        let status = self.payment.check_status(transaction_id).await?;
        let payment_mode = match &status {
            SettlementStatus::Completed { payment_mode } => payment_mode.clone(),
            SettlementStatus::Pending => {
                return Ok(VerificationOutcome {
                    status: VerificationStatus::Pending,
                    already_settled: false,
                    order_ids: Vec::new(),
                });
            }
            SettlementStatus::Failed => {
                self.event_sender
                    .send(Event::PaymentFailed {
                        transaction_id: transaction_id.to_string(),
                    })
                    .await;
                return Ok(VerificationOutcome {
                    status: VerificationStatus::Failed,
                    already_settled: false,
                    order_ids: Vec::new(),
                });
            }
        };

        let orders = order::Entity::find()
            .filter(order::Column::TransactionId.eq(transaction_id))
            .all(self.db.as_ref())
            .await?;
        if orders.is_empty() {
            return Err(ServiceError::NotFound(format!(
                "No orders for transaction {transaction_id}"
            )));
        }
        let order_ids: Vec<Uuid> = orders.iter().map(|o| o.id).collect();
        let total: rust_decimal::Decimal = orders.iter().map(|o| o.amount).sum();

        let txn = self.db.begin().await?;

        // Idempotency guard. A second verification of the same transaction
        // conflicts here and applies nothing.
        let guard = settlement::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_id: Set(transaction_id.to_string()),
            kind: Set(SettlementKind::Order),
            amount: Set(total),
            settled_at: Set(Utc::now()),
        };
        let inserted = settlement::Entity::insert(guard)
            .on_conflict(
                OnConflict::column(settlement::Column::TransactionId)
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await?;
        if inserted == 0 {
            txn.rollback().await?;
            info!(%transaction_id, "settlement already applied");
            return Ok(VerificationOutcome {
                status: VerificationStatus::Completed,
                already_settled: true,
                order_ids,
            });
        }

        let product_ids: Vec<Uuid> = orders.iter().map(|o| o.product_id).collect();
        for row in &orders {
            self.apply_order_settlement(&txn, row, payment_mode.clone())
                .await?;
        }

        let buyer_id = orders[0].buyer_id;
        let coupon = self
            .coupons
            .issue_for_purchase(
                &txn,
                buyer_id,
                self.config.purchase_coupon_percent as i32,
                self.config.purchase_coupon_valid_days,
            )
            .await?;

        // The purchased items leave the buyer's cart and wishlist with the sale.
        self.carts
            .clear_purchased(&txn, buyer_id, &product_ids)
            .await?;

        txn.commit().await?;
        info!(%transaction_id, orders = order_ids.len(), "payment settled");

        self.event_sender
            .send(Event::PaymentSettled {
                transaction_id: transaction_id.to_string(),
                order_ids: order_ids.clone(),
            })
            .await;
        self.event_sender
            .send(Event::CouponIssued {
                coupon_id: coupon.id,
                user_id: buyer_id,
            })
            .await;

        // Everything past the commit is best effort.
        for row in &orders {
            self.dispatch_fulfillment(row).await;
        }
        self.send_settlement_notices(&orders, &coupon.code).await;

        Ok(VerificationOutcome {
            status: VerificationStatus::Completed,
            already_settled: false,
            order_ids,
        })
    }

    /// Marks one order paid, flags the product sold, and credits the seller.
    async fn apply_order_settlement(
        &self,
        txn: &DatabaseTransaction,
        row: &order::Model,
        payment_mode: Option<String>,
    ) -> Result<(), ServiceError> {
        let mut active: order::ActiveModel = row.clone().into();
        active.payment_status = Set(PaymentStatus::Paid);
        if payment_mode.is_some() {
            active.payment_mode = Set(payment_mode);
        }
        active.updated_at = Set(Some(Utc::now()));
        active.update(txn).await?;

        product::Entity::update_many()
            .col_expr(product::Column::SoldStatus, Expr::value(true))
            .filter(product::Column::Id.eq(row.product_id))
            .exec(txn)
            .await?;

        user::Entity::update_many()
            .col_expr(
                user::Column::Balance,
                Expr::col(user::Column::Balance).add(row.amount),
            )
            .col_expr(
                user::Column::TotalSold,
                Expr::col(user::Column::TotalSold).add(1),
            )
            .filter(user::Column::Id.eq(row.seller_id))
            .exec(txn)
            .await?;
        Ok(())
    }

    /// Books a carrier shipment for a settled order. Skipped when the seller
    /// has no pickup address; failures are logged and the order stays
    /// unshipped for manual handling.
    async fn dispatch_fulfillment(&self, row: &order::Model) {
        let result = self.try_dispatch_fulfillment(row).await;
        if let Err(e) = result {
            error!(order_id = %row.id, "fulfillment dispatch failed: {}", e);
        }
    }

    async fn try_dispatch_fulfillment(&self, row: &order::Model) -> Result<(), ServiceError> {
        let seller = user::Entity::find_by_id(row.seller_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Seller not found".to_string()))?;
        let Some(pickup) = seller.pickup_address() else {
            warn!(order_id = %row.id, seller_id = %row.seller_id, "seller has no pickup address, skipping shipment");
            return Ok(());
        };
        let listing = product::Entity::find_by_id(row.product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        let delivery = address::Entity::find_by_id(row.address_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Delivery address not found".to_string()))?;

        let request = ShipmentRequest {
            order_id: row.id.to_string(),
            product_title: listing.title,
            amount_minor: to_minor_units(row.amount)?,
            pickup_name: seller.name,
            pickup_line: pickup.line,
            pickup_city: pickup.city,
            pickup_state: pickup.state,
            pickup_postal_code: pickup.postal_code,
            pickup_country: pickup.country,
            recipient_name: delivery.recipient_name,
            recipient_phone: delivery.phone,
            delivery_line: delivery.line1,
            delivery_city: delivery.city,
            delivery_state: delivery.state,
            delivery_postal_code: delivery.postal_code,
            delivery_country: delivery.country,
            // Placeholder package; sellers do not weigh their parcels.
            weight_kg: 0.5,
            length_cm: 10,
            width_cm: 10,
            height_cm: 10,
        };
        let details = self.shipping.create_shipment(&request).await?;

        let mut active: order::ActiveModel = row.clone().into();
        active.shipment_id = Set(Some(details.shipment_id.clone()));
        active.awb_code = Set(details.awb_code);
        active.tracking_url = Set(details.tracking_url);
        active.label_url = Set(details.label_url);
        active.shipment_status = Set(Some(details.status));
        active.updated_at = Set(Some(Utc::now()));
        active.update(self.db.as_ref()).await?;

        self.event_sender
            .send(Event::ShipmentCreated {
                order_id: row.id,
                shipment_id: details.shipment_id,
            })
            .await;
        Ok(())
    }

    async fn send_settlement_notices(&self, orders: &[order::Model], coupon_code: &str) {
        let buyer_id = orders[0].buyer_id;
        if let Err(e) = self
            .notifications
            .notify(
                buyer_id,
                "Order confirmed",
                &format!(
                    "Your payment went through. Here is a thank-you coupon: {coupon_code}"
                ),
            )
            .await
        {
            warn!(%buyer_id, "buyer settlement notice failed: {}", e);
        }
        for row in orders {
            if let Err(e) = self
                .notifications
                .notify(
                    row.seller_id,
                    "Item sold",
                    "One of your listings just sold. Get it ready for pickup!",
                )
                .await
            {
                warn!(seller_id = %row.seller_id, "seller settlement notice failed: {}", e);
            }
        }
    }
}

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, TransactionTrait};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::order::{self, DeliveryStatus, PaymentStatus};
use crate::entities::{product, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::{PaymentGateway, RefundOutcome, ShippingAggregator};

use super::{to_minor_units, NotificationService};

/// Buyer-initiated order cancellation with refund. External calls come first;
/// the local state is only reverted once the carrier and the gateway have
/// both accepted.
pub struct CancellationService {
    db: Arc<DatabaseConnection>,
    payment: Arc<dyn PaymentGateway>,
    shipping: Arc<dyn ShippingAggregator>,
    notifications: Arc<NotificationService>,
    event_sender: EventSender,
}

impl CancellationService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        payment: Arc<dyn PaymentGateway>,
        shipping: Arc<dyn ShippingAggregator>,
        notifications: Arc<NotificationService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            payment,
            shipping,
            notifications,
            event_sender,
        }
    }

    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn cancel_order(
        &self,
        requester: &AuthUser,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        if found.buyer_id != requester.user_id {
            return Err(ServiceError::Forbidden(
                "Order belongs to another buyer".to_string(),
            ));
        }
        if !found.delivery_status.is_cancelable() {
            return Err(ServiceError::InvalidOperation(format!(
                "Order cannot be cancelled once {}",
                found.delivery_status
            )));
        }

        // Carrier first. A booked shipment that cannot be recalled blocks the
        // cancellation outright.
        if let Some(shipment_id) = &found.shipment_id {
            self.shipping.cancel_shipment(shipment_id).await?;
        }

        let txn = self.db.begin().await?;

        // Conditional claim: only one cancellation can flip the status row.
        // Zero rows means a concurrent cancel won, so no refund is issued.
        let claimed = order::Entity::update_many()
            .col_expr(
                order::Column::PaymentStatus,
                Expr::value(PaymentStatus::Canceled),
            )
            .col_expr(
                order::Column::DeliveryStatus,
                Expr::value(DeliveryStatus::Cancelled),
            )
            .col_expr(order::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(order::Column::Id.eq(order_id))
            .filter(order::Column::DeliveryStatus.is_in([
                DeliveryStatus::Pending,
                DeliveryStatus::Rejected,
            ]))
            .exec(&txn)
            .await?;
        if claimed.rows_affected == 0 {
            txn.rollback().await?;
            return Err(ServiceError::InvalidOperation(
                "Order is no longer cancelable".to_string(),
            ));
        }

        let was_paid = found.payment_status == PaymentStatus::Paid;
        let refunded = if was_paid {
            let amount_minor = to_minor_units(found.amount)?;
            match self
                .payment
                .refund(&found.transaction_id, amount_minor)
                .await?
            {
                RefundOutcome::Accepted => true,
                RefundOutcome::Rejected => {
                    txn.rollback().await?;
                    return Err(ServiceError::PaymentFailed(
                        "Refund was rejected by the payment gateway".to_string(),
                    ));
                }
            }
        } else {
            false
        };

        if was_paid {
            user::Entity::update_many()
                .col_expr(
                    user::Column::Balance,
                    Expr::col(user::Column::Balance).sub(found.amount),
                )
                .col_expr(
                    user::Column::TotalSold,
                    Expr::col(user::Column::TotalSold).sub(1),
                )
                .filter(user::Column::Id.eq(found.seller_id))
                .exec(&txn)
                .await?;
        }
        product::Entity::update_many()
            .col_expr(product::Column::SoldStatus, Expr::value(false))
            .filter(product::Column::Id.eq(found.product_id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        let seller_id = found.seller_id;
        let updated = order::Entity::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;

        info!(%order_id, refunded, "order cancelled");
        self.event_sender
            .send(Event::OrderCancelled { order_id, refunded })
            .await;

        let buyer_note = if refunded {
            "Your order was cancelled and the refund is on its way."
        } else {
            "Your order was cancelled."
        };
        if let Err(e) = self
            .notifications
            .notify(requester.user_id, "Order cancelled", buyer_note)
            .await
        {
            warn!(buyer_id = %requester.user_id, "buyer cancellation notice failed: {}", e);
        }
        if let Err(e) = self
            .notifications
            .notify(
                seller_id,
                "Order cancelled",
                "The buyer cancelled an order. The listing is live again.",
            )
            .await
        {
            warn!(%seller_id, "seller cancellation notice failed: {}", e);
        }
        Ok(updated)
    }
}

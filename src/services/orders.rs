use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::order::{self, DeliveryStatus, PaymentStatus};
use crate::entities::{address, product, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::{PaymentGateway, ShippingAggregator, TrackingInfo};

use super::{new_transaction_id, to_minor_units};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub price: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(min = 1, message = "at least one item is required"))]
    pub items: Vec<CheckoutItem>,
    pub total_amount: Decimal,
    pub address_id: Uuid,
    pub payment_mode: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub transaction_id: String,
    pub redirect_url: String,
    pub order_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateDeliveryStatusRequest {
    pub status: DeliveryStatus,
}

/// Order intake and delivery-status transitions.
pub struct OrderService {
    db: Arc<DatabaseConnection>,
    payment: Arc<dyn PaymentGateway>,
    shipping: Arc<dyn ShippingAggregator>,
    event_sender: EventSender,
}

impl OrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        payment: Arc<dyn PaymentGateway>,
        shipping: Arc<dyn ShippingAggregator>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            payment,
            shipping,
            event_sender,
        }
    }

    /// Starts a checkout: validates the buyer, address, and items, opens a
    /// gateway transaction for the total, then persists one pending order per
    /// item under the shared transaction id. The gateway call comes first; if
    /// it fails nothing is written.
    #[instrument(skip(self, request), fields(buyer_id = %buyer.user_id))]
    pub async fn checkout(
        &self,
        buyer: &AuthUser,
        request: CheckoutRequest,
    ) -> Result<CheckoutResponse, ServiceError> {
        request.validate()?;

        let buyer_row = user::Entity::find_by_id(buyer.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Buyer not found".to_string()))?;
        if buyer_row.blocked {
            return Err(ServiceError::Forbidden("Account is blocked".to_string()));
        }
        if !buyer_row.phone_verified {
            return Err(ServiceError::Forbidden(
                "Phone number must be verified before purchase".to_string(),
            ));
        }

        let delivery_address = address::Entity::find_by_id(request.address_id)
            .filter(address::Column::UserId.eq(buyer.user_id))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Delivery address not found".to_string()))?;

        let mut products = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let found = product::Entity::find_by_id(item.product_id)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", item.product_id))
                })?;
            if found.sold_status {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product '{}' is already sold",
                    found.title
                )));
            }
            if found.seller_id == buyer.user_id {
                return Err(ServiceError::InvalidOperation(
                    "Cannot buy your own listing".to_string(),
                ));
            }
            if found.price != item.price {
                return Err(ServiceError::ValidationError(format!(
                    "Price changed for '{}'",
                    found.title
                )));
            }
            products.push(found);
        }

        let expected_total: Decimal = products.iter().map(|p| p.price).sum();
        if expected_total != request.total_amount {
            return Err(ServiceError::ValidationError(
                "Total amount does not match item prices".to_string(),
            ));
        }

        let transaction_id = new_transaction_id("TXN");
        let amount_minor = to_minor_units(request.total_amount)?;

        // Gateway first. A rejected initiation leaves no trace in the store.
        let initiated = self
            .payment
            .initiate_payment(&transaction_id, amount_minor)
            .await?;

        let now = Utc::now();
        let mut order_ids = Vec::with_capacity(products.len());
        let rows: Vec<order::ActiveModel> = products
            .iter()
            .map(|p| {
                let id = Uuid::new_v4();
                order_ids.push(id);
                order::ActiveModel {
                    id: Set(id),
                    buyer_id: Set(buyer.user_id),
                    seller_id: Set(p.seller_id),
                    product_id: Set(p.id),
                    address_id: Set(delivery_address.id),
                    transaction_id: Set(transaction_id.clone()),
                    amount: Set(p.price),
                    payment_status: Set(PaymentStatus::Pending),
                    delivery_status: Set(DeliveryStatus::Pending),
                    payment_mode: Set(request.payment_mode.clone()),
                    shipment_id: Set(None),
                    awb_code: Set(None),
                    tracking_url: Set(None),
                    label_url: Set(None),
                    shipment_status: Set(None),
                    created_at: Set(now),
                    updated_at: Set(None),
                }
            })
            .collect();
        order::Entity::insert_many(rows).exec(self.db.as_ref()).await?;

        for order_id in &order_ids {
            self.event_sender
                .send(Event::OrderCreated {
                    order_id: *order_id,
                    buyer_id: buyer.user_id,
                    transaction_id: transaction_id.clone(),
                })
                .await;
        }

        info!(%transaction_id, orders = order_ids.len(), "checkout started");
        Ok(CheckoutResponse {
            transaction_id,
            redirect_url: initiated.redirect_url,
            order_ids,
        })
    }

    /// Moves an order along the delivery state machine. Only the seller (or an
    /// admin) may update, and only along legal edges.
    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn update_delivery_status(
        &self,
        requester: &AuthUser,
        order_id: Uuid,
        next: DeliveryStatus,
    ) -> Result<order::Model, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        if found.seller_id != requester.user_id && !requester.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only the seller may update delivery status".to_string(),
            ));
        }
        if !found.delivery_status.can_transition_to(next) {
            return Err(ServiceError::InvalidOperation(format!(
                "Cannot move delivery status from {} to {}",
                found.delivery_status, next
            )));
        }

        let product_id = found.product_id;
        let mut active: order::ActiveModel = found.into();
        active.delivery_status = Set(next);
        active.updated_at = Set(Some(Utc::now()));
        let updated = active.update(self.db.as_ref()).await?;

        // Delivery confirms the sale; re-assert the flag in case anything
        // flipped it in the meantime.
        if next == DeliveryStatus::Delivered {
            product::Entity::update_many()
                .col_expr(product::Column::SoldStatus, Expr::value(true))
                .filter(product::Column::Id.eq(product_id))
                .exec(self.db.as_ref())
                .await?;
        }

        self.event_sender
            .send(Event::DeliveryStatusChanged {
                order_id,
                status: next.to_string(),
            })
            .await;
        Ok(updated)
    }

    pub async fn get_order(
        &self,
        requester: &AuthUser,
        order_id: Uuid,
    ) -> Result<order::Model, ServiceError> {
        let found = order::Entity::find_by_id(order_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Order not found".to_string()))?;
        if found.buyer_id != requester.user_id
            && found.seller_id != requester.user_id
            && !requester.is_admin()
        {
            return Err(ServiceError::Forbidden(
                "Order belongs to another user".to_string(),
            ));
        }
        Ok(found)
    }

    /// Live carrier tracking for a shipped order.
    pub async fn track_order(
        &self,
        requester: &AuthUser,
        order_id: Uuid,
    ) -> Result<TrackingInfo, ServiceError> {
        let found = self.get_order(requester, order_id).await?;
        let awb_code = found.awb_code.ok_or_else(|| {
            ServiceError::InvalidOperation("Order has no shipment to track".to_string())
        })?;
        self.shipping.track_by_awb(&awb_code).await
    }

    /// Orders where the requester is the buyer, newest first.
    pub async fn list_purchases(
        &self,
        requester: &AuthUser,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::BuyerId.eq(requester.user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }

    /// Orders where the requester is the seller, newest first.
    pub async fn list_sales(
        &self,
        requester: &AuthUser,
    ) -> Result<Vec<order::Model>, ServiceError> {
        Ok(order::Entity::find()
            .filter(order::Column::SellerId.eq(requester.user_id))
            .order_by_desc(order::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }
}

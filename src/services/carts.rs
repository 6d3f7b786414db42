use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::{cart_item, product, wishlist_item};
use crate::errors::ServiceError;

use super::NotificationService;

const STALE_CART_TITLE: &str = "Still thinking it over?";

/// Cart and wishlist maintenance: membership, post-settlement cleanup, and the
/// stale-cart reminder sweep.
pub struct CartService {
    db: Arc<DatabaseConnection>,
    notifications: Arc<NotificationService>,
    reminder_days: i64,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        notifications: Arc<NotificationService>,
        reminder_days: i64,
    ) -> Self {
        Self {
            db,
            notifications,
            reminder_days,
        }
    }

    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn add_to_cart(
        &self,
        requester: &AuthUser,
        product_id: Uuid,
    ) -> Result<cart_item::Model, ServiceError> {
        let listing = product::Entity::find_by_id(product_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Product not found".to_string()))?;
        if listing.sold_status {
            return Err(ServiceError::InvalidOperation(
                "Product is already sold".to_string(),
            ));
        }
        let existing = cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(requester.user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(self.db.as_ref())
            .await?;
        if let Some(row) = existing {
            return Ok(row);
        }
        Ok(cart_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(requester.user_id),
            product_id: Set(product_id),
            added_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?)
    }

    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn remove_from_cart(
        &self,
        requester: &AuthUser,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(requester.user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    pub async fn list_cart(
        &self,
        requester: &AuthUser,
    ) -> Result<Vec<cart_item::Model>, ServiceError> {
        Ok(cart_item::Entity::find()
            .filter(cart_item::Column::UserId.eq(requester.user_id))
            .all(self.db.as_ref())
            .await?)
    }

    /// Removes the purchased products from the buyer's cart and wishlist.
    /// Runs on the settlement transaction so cleanup is atomic with the
    /// payment.
    pub async fn clear_purchased<C: ConnectionTrait>(
        &self,
        conn: &C,
        buyer_id: Uuid,
        product_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        if product_ids.is_empty() {
            return Ok(());
        }
        cart_item::Entity::delete_many()
            .filter(cart_item::Column::UserId.eq(buyer_id))
            .filter(cart_item::Column::ProductId.is_in(product_ids.to_vec()))
            .exec(conn)
            .await?;
        wishlist_item::Entity::delete_many()
            .filter(wishlist_item::Column::UserId.eq(buyer_id))
            .filter(wishlist_item::Column::ProductId.is_in(product_ids.to_vec()))
            .exec(conn)
            .await?;
        Ok(())
    }

    /// Nudges owners of cart items older than the reminder window. A user with
    /// an unread reminder is skipped so sweeps do not pile up notifications.
    #[instrument(skip(self))]
    pub async fn remind_stale_carts(&self) -> Result<usize, ServiceError> {
        let cutoff = Utc::now() - Duration::days(self.reminder_days);
        let stale = cart_item::Entity::find()
            .filter(cart_item::Column::AddedAt.lt(cutoff))
            .all(self.db.as_ref())
            .await?;

        let owners: BTreeSet<Uuid> = stale.iter().map(|item| item.user_id).collect();
        let mut reminded = 0;
        for user_id in owners {
            if self
                .notifications
                .has_unread_with_title(user_id, STALE_CART_TITLE)
                .await?
            {
                continue;
            }
            if let Err(e) = self
                .notifications
                .notify(
                    user_id,
                    STALE_CART_TITLE,
                    "Items in your cart are waiting. Secondhand finds go fast!",
                )
                .await
            {
                warn!(%user_id, "stale cart reminder failed: {}", e);
                continue;
            }
            reminded += 1;
        }
        if reminded > 0 {
            info!(reminded, "stale cart reminders sent");
        }
        Ok(reminded)
    }
}

use chrono::{Duration, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait,
    QueryFilter, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::coupon;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCouponRequest {
    #[validate(length(min = 3, max = 32))]
    pub code: String,
    #[validate(range(min = 1, max = 100))]
    pub discount_percent: i32,
    pub assigned_to: Option<Uuid>,
    pub expires_at: chrono::DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedeemCouponRequest {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RedeemCouponResponse {
    pub code: String,
    pub discount_percent: i32,
}

/// Coupon issuance and redemption. Purchase thank-you coupons are created
/// inside the settlement transaction; admin coupons through `create`.
pub struct CouponService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl CouponService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self, request), fields(user_id = %requester.user_id))]
    pub async fn create(
        &self,
        requester: &AuthUser,
        request: CreateCouponRequest,
    ) -> Result<coupon::Model, ServiceError> {
        request.validate()?;
        if request.expires_at <= Utc::now() {
            return Err(ServiceError::ValidationError(
                "Expiry must be in the future".to_string(),
            ));
        }
        let code = request.code.to_uppercase();
        let existing = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.clone()))
            .one(self.db.as_ref())
            .await?;
        if existing.is_some() {
            return Err(ServiceError::InvalidOperation(
                "Coupon code already exists".to_string(),
            ));
        }

        let created = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(code),
            discount_percent: Set(request.discount_percent),
            created_by: Set(Some(requester.user_id)),
            assigned_to: Set(request.assigned_to),
            expires_at: Set(request.expires_at),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        self.event_sender
            .send(Event::CouponIssued {
                coupon_id: created.id,
                user_id: request.assigned_to.unwrap_or(requester.user_id),
            })
            .await;
        info!(code = %created.code, "coupon created");
        Ok(created)
    }

    /// Issues the post-purchase thank-you coupon on the caller's transaction
    /// so it commits (or rolls back) together with the settlement.
    pub async fn issue_for_purchase<C: ConnectionTrait>(
        &self,
        conn: &C,
        buyer_id: Uuid,
        discount_percent: i32,
        valid_days: i64,
    ) -> Result<coupon::Model, ServiceError> {
        let created = coupon::ActiveModel {
            id: Set(Uuid::new_v4()),
            code: Set(generate_code("THANKS")),
            discount_percent: Set(discount_percent),
            created_by: Set(None),
            assigned_to: Set(Some(buyer_id)),
            expires_at: Set(Utc::now() + Duration::days(valid_days)),
            created_at: Set(Utc::now()),
        }
        .insert(conn)
        .await?;
        Ok(created)
    }

    /// Redeems a coupon for the requester. Coupons are single use; the row is
    /// deleted on success.
    #[instrument(skip(self), fields(user_id = %requester.user_id))]
    pub async fn redeem(
        &self,
        requester: &AuthUser,
        code: &str,
    ) -> Result<RedeemCouponResponse, ServiceError> {
        let found = coupon::Entity::find()
            .filter(coupon::Column::Code.eq(code.to_uppercase()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Coupon not found".to_string()))?;

        if let Some(assignee) = found.assigned_to {
            if assignee != requester.user_id {
                return Err(ServiceError::Forbidden(
                    "Coupon is assigned to another user".to_string(),
                ));
            }
        }
        if found.expires_at <= Utc::now() {
            return Err(ServiceError::InvalidOperation(
                "Coupon has expired".to_string(),
            ));
        }

        let response = RedeemCouponResponse {
            code: found.code.clone(),
            discount_percent: found.discount_percent,
        };
        let coupon_id = found.id;
        found.delete(self.db.as_ref()).await?;

        self.event_sender
            .send(Event::CouponRedeemed {
                coupon_id,
                user_id: requester.user_id,
            })
            .await;
        info!(code = %response.code, "coupon redeemed");
        Ok(response)
    }

    pub async fn list_for_user(
        &self,
        requester: &AuthUser,
    ) -> Result<Vec<coupon::Model>, ServiceError> {
        Ok(coupon::Entity::find()
            .filter(coupon::Column::AssignedTo.eq(requester.user_id))
            .filter(coupon::Column::ExpiresAt.gt(Utc::now()))
            .all(self.db.as_ref())
            .await?)
    }
}

fn generate_code(prefix: &str) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(|c| (c as char).to_ascii_uppercase())
        .collect();
    format!("{prefix}-{suffix}")
}

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::sea_query::OnConflict;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::auth::AuthUser;
use crate::entities::settlement::{self, SettlementKind};
use crate::entities::{boost, boost_product, product, spotlight_product, user};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::gateways::{PaymentGateway, SettlementStatus};

use super::{new_transaction_id, to_minor_units, NotificationService};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateBoostOrderRequest {
    #[validate(range(min = 1, max = 30))]
    pub plan_days: i32,
    pub price: Decimal,
    #[validate(length(min = 1, message = "at least one product is required"))]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateBoostOrderResponse {
    pub transaction_id: String,
    pub redirect_url: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VerifyBoostRequest {
    #[validate(length(min = 1))]
    pub transaction_id: String,
    #[validate(range(min = 1, max = 30))]
    pub plan_days: i32,
    pub price: Decimal,
    #[validate(length(min = 1, message = "at least one product is required"))]
    pub product_ids: Vec<Uuid>,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyBoostResponse {
    pub status: String,
    pub already_settled: bool,
    pub boost_id: Option<Uuid>,
}

/// Paid promotion of listings. Intake initiates the gateway transaction;
/// verification creates the boost and promotes its products into the
/// spotlight. The expiry sweep undoes both.
pub struct BoostService {
    db: Arc<DatabaseConnection>,
    payment: Arc<dyn PaymentGateway>,
    notifications: Arc<NotificationService>,
    event_sender: EventSender,
}

impl BoostService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        payment: Arc<dyn PaymentGateway>,
        notifications: Arc<NotificationService>,
        event_sender: EventSender,
    ) -> Self {
        Self {
            db,
            payment,
            notifications,
            event_sender,
        }
    }

    /// Validates the plan and opens a gateway transaction for it. Nothing is
    /// persisted until the payment verifies.
    #[instrument(skip(self, request), fields(seller_id = %seller.user_id))]
    pub async fn create_boost_order(
        &self,
        seller: &AuthUser,
        request: CreateBoostOrderRequest,
    ) -> Result<CreateBoostOrderResponse, ServiceError> {
        request.validate()?;
        self.check_seller(seller).await?;
        self.check_products(seller, &request.product_ids).await?;

        let transaction_id = new_transaction_id("BST");
        let initiated = self
            .payment
            .initiate_payment(&transaction_id, to_minor_units(request.price)?)
            .await?;

        info!(%transaction_id, "boost payment initiated");
        Ok(CreateBoostOrderResponse {
            transaction_id,
            redirect_url: initiated.redirect_url,
        })
    }

    /// Verifies the boost payment and activates the boost exactly once.
    #[instrument(skip(self, request), fields(seller_id = %seller.user_id))]
    pub async fn verify_boost_payment(
        &self,
        seller: &AuthUser,
        request: VerifyBoostRequest,
    ) -> Result<VerifyBoostResponse, ServiceError> {
        request.validate()?;

        match self.payment.check_status(&request.transaction_id).await? {
            SettlementStatus::Completed { .. } => {}
            SettlementStatus::Pending => {
                return Ok(VerifyBoostResponse {
                    status: "pending".to_string(),
                    already_settled: false,
                    boost_id: None,
                });
            }
            SettlementStatus::Failed => {
                self.event_sender
                    .send(Event::PaymentFailed {
                        transaction_id: request.transaction_id.clone(),
                    })
                    .await;
                return Ok(VerifyBoostResponse {
                    status: "failed".to_string(),
                    already_settled: false,
                    boost_id: None,
                });
            }
        }

        self.check_products(seller, &request.product_ids).await?;

        let txn = self.db.begin().await?;
        let guard = settlement::ActiveModel {
            id: Set(Uuid::new_v4()),
            transaction_id: Set(request.transaction_id.clone()),
            kind: Set(SettlementKind::Boost),
            amount: Set(request.price),
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
            info!(transaction_id = %request.transaction_id, "boost already activated");
            return Ok(VerifyBoostResponse {
                status: "completed".to_string(),
                already_settled: true,
                boost_id: None,
            });
        }

        let now = Utc::now();
        let created = boost::ActiveModel {
            id: Set(Uuid::new_v4()),
            seller_id: Set(seller.user_id),
            transaction_id: Set(request.transaction_id.clone()),
            plan_days: Set(request.plan_days),
            price: Set(request.price),
            starts_at: Set(now),
            ends_at: Set(now + Duration::days(request.plan_days as i64)),
            created_at: Set(now),
        }
        .insert(&txn)
        .await?;

        for product_id in &request.product_ids {
            boost_product::ActiveModel {
                id: Set(Uuid::new_v4()),
                boost_id: Set(created.id),
                product_id: Set(*product_id),
            }
            .insert(&txn)
            .await?;
            promote_to_spotlight(&txn, *product_id).await?;
        }
        txn.commit().await?;

        info!(boost_id = %created.id, products = request.product_ids.len(), "boost activated");
        self.event_sender
            .send(Event::BoostActivated {
                boost_id: created.id,
                seller_id: seller.user_id,
            })
            .await;
        if let Err(e) = self
            .notifications
            .notify(
                seller.user_id,
                "Boost active",
                "Your listings are now in the spotlight.",
            )
            .await
        {
            warn!(seller_id = %seller.user_id, "boost notice failed: {}", e);
        }

        Ok(VerifyBoostResponse {
            status: "completed".to_string(),
            already_settled: false,
            boost_id: Some(created.id),
        })
    }

    /// Removes expired boosts along with their product links and spotlight
    /// entries. Invoked by the scheduled sweep.
    #[instrument(skip(self))]
    pub async fn expire_boosts(&self) -> Result<usize, ServiceError> {
        let now = Utc::now();
        let expired = boost::Entity::find()
            .filter(boost::Column::EndsAt.lt(now))
            .all(self.db.as_ref())
            .await?;
        if expired.is_empty() {
            return Ok(0);
        }

        for stale in &expired {
            let links = boost_product::Entity::find()
                .filter(boost_product::Column::BoostId.eq(stale.id))
                .all(self.db.as_ref())
                .await?;
            let product_ids: Vec<Uuid> = links.iter().map(|l| l.product_id).collect();

            let txn = self.db.begin().await?;
            spotlight_product::Entity::delete_many()
                .filter(spotlight_product::Column::ProductId.is_in(product_ids))
                .exec(&txn)
                .await?;
            boost_product::Entity::delete_many()
                .filter(boost_product::Column::BoostId.eq(stale.id))
                .exec(&txn)
                .await?;
            boost::Entity::delete_by_id(stale.id).exec(&txn).await?;
            txn.commit().await?;

            self.event_sender
                .send(Event::BoostExpired { boost_id: stale.id })
                .await;
        }
        info!(expired = expired.len(), "expired boosts swept");
        Ok(expired.len())
    }

    /// Spotlight listing, ordered by position.
    pub async fn spotlight(&self) -> Result<Vec<spotlight_product::Model>, ServiceError> {
        Ok(spotlight_product::Entity::find()
            .order_by_asc(spotlight_product::Column::Position)
            .all(self.db.as_ref())
            .await?)
    }

    async fn check_seller(&self, seller: &AuthUser) -> Result<(), ServiceError> {
        let row = user::Entity::find_by_id(seller.user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Seller not found".to_string()))?;
        if row.blocked {
            return Err(ServiceError::Forbidden("Account is blocked".to_string()));
        }
        if !row.phone_verified {
            return Err(ServiceError::Forbidden(
                "Phone number must be verified before boosting".to_string(),
            ));
        }
        Ok(())
    }

    async fn check_products(
        &self,
        seller: &AuthUser,
        product_ids: &[Uuid],
    ) -> Result<(), ServiceError> {
        for product_id in product_ids {
            let found = product::Entity::find_by_id(*product_id)
                .one(self.db.as_ref())
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {product_id} not found"))
                })?;
            if found.seller_id != seller.user_id {
                return Err(ServiceError::Forbidden(
                    "Can only boost your own listings".to_string(),
                ));
            }
            if found.sold_status {
                return Err(ServiceError::InvalidOperation(format!(
                    "Product '{}' is already sold",
                    found.title
                )));
            }
        }
        Ok(())
    }
}

/// Re-inserts the product at the tail of the spotlight. Boosting an already
/// spotlighted product moves it to the freshest position instead of
/// duplicating it.
async fn promote_to_spotlight(
    txn: &DatabaseTransaction,
    product_id: Uuid,
) -> Result<(), ServiceError> {
    spotlight_product::Entity::delete_by_id(product_id)
        .exec(txn)
        .await?;
    let tail = spotlight_product::Entity::find()
        .order_by_desc(spotlight_product::Column::Position)
        .one(txn)
        .await?
        .map(|row| row.position)
        .unwrap_or(0);
    spotlight_product::ActiveModel {
        product_id: Set(product_id),
        position: Set(tail + 1),
        added_at: Set(Utc::now()),
    }
    .insert(txn)
    .await?;
    Ok(())
}

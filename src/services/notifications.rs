use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::sync::Arc;
use tracing::{instrument, warn};
use uuid::Uuid;

use crate::entities::{notification, user};
use crate::errors::ServiceError;
use crate::gateways::EmailSender;

/// Writes in-app notifications and mirrors them to email best effort. Email
/// failures are logged and never surfaced to the caller.
pub struct NotificationService {
    db: Arc<DatabaseConnection>,
    email: Arc<dyn EmailSender>,
}

impl NotificationService {
    pub fn new(db: Arc<DatabaseConnection>, email: Arc<dyn EmailSender>) -> Self {
        Self { db, email }
    }

    #[instrument(skip(self, message))]
    pub async fn notify(
        &self,
        user_id: Uuid,
        title: &str,
        message: &str,
    ) -> Result<(), ServiceError> {
        notification::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            title: Set(title.to_string()),
            message: Set(message.to_string()),
            read: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(self.db.as_ref())
        .await?;

        if let Some(user) = user::Entity::find_by_id(user_id).one(self.db.as_ref()).await? {
            if let Err(e) = self.email.send(&user.email, title, message).await {
                warn!(%user_id, "email delivery failed: {}", e);
            }
        }
        Ok(())
    }

    /// True when the user already has an unread notification with this title.
    /// Used by the stale-cart sweep to avoid repeating the same reminder.
    pub async fn has_unread_with_title(
        &self,
        user_id: Uuid,
        title: &str,
    ) -> Result<bool, ServiceError> {
        let existing = notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .filter(notification::Column::Title.eq(title))
            .filter(notification::Column::Read.eq(false))
            .one(self.db.as_ref())
            .await?;
        Ok(existing.is_some())
    }

    #[instrument(skip(self))]
    pub async fn mark_read(&self, user_id: Uuid, notification_id: Uuid) -> Result<(), ServiceError> {
        let found = notification::Entity::find_by_id(notification_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Notification not found".to_string()))?;
        if found.user_id != user_id {
            return Err(ServiceError::Forbidden(
                "Notification belongs to another user".to_string(),
            ));
        }
        let mut active: notification::ActiveModel = found.into();
        active.read = Set(true);
        active.update(self.db.as_ref()).await?;
        Ok(())
    }

    pub async fn list_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<notification::Model>, ServiceError> {
        use sea_orm::QueryOrder;
        Ok(notification::Entity::find()
            .filter(notification::Column::UserId.eq(user_id))
            .order_by_desc(notification::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?)
    }
}

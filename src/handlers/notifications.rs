use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::notification;
use crate::{ApiResponse, ApiResult, AppState};

/// GET /api/v1/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<notification::Model>> {
    let rows = state
        .services
        .notifications
        .list_for_user(user.user_id)
        .await?;
    Ok(Json(ApiResponse::ok(rows)))
}

/// PUT /api/v1/notifications/:id/read
pub async fn mark_notification_read(
    State(state): State<AppState>,
    user: AuthUser,
    Path(notification_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .services
        .notifications
        .mark_read(user.user_id, notification_id)
        .await?;
    Ok(Json(ApiResponse::ok(())))
}

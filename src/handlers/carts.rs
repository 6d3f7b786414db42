use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::cart_item;
use crate::{ApiResponse, ApiResult, AppState};

/// POST /api/v1/cart/:product_id
pub async fn add_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<cart_item::Model> {
    let row = state.services.carts.add_to_cart(&user, product_id).await?;
    Ok(Json(ApiResponse::ok(row)))
}

/// DELETE /api/v1/cart/:product_id
pub async fn remove_from_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> ApiResult<()> {
    state
        .services
        .carts
        .remove_from_cart(&user, product_id)
        .await?;
    Ok(Json(ApiResponse::ok(())))
}

/// GET /api/v1/cart
pub async fn list_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<cart_item::Model>> {
    let rows = state.services.carts.list_cart(&user).await?;
    Ok(Json(ApiResponse::ok(rows)))
}

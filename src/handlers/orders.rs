use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::entities::order;
use crate::gateways::TrackingInfo;
use crate::services::orders::{CheckoutRequest, CheckoutResponse, UpdateDeliveryStatusRequest};
use crate::{ApiResponse, ApiResult, AppState};

/// POST /api/v1/orders/checkout
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<CheckoutResponse> {
    let response = state.services.orders.checkout(&user, request).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/v1/orders/:id
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let found = state.services.orders.get_order(&user, order_id).await?;
    Ok(Json(ApiResponse::ok(found)))
}

/// GET /api/v1/orders/purchases
pub async fn list_purchases(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<order::Model>> {
    let orders = state.services.orders.list_purchases(&user).await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// GET /api/v1/orders/sales
pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<order::Model>> {
    let orders = state.services.orders.list_sales(&user).await?;
    Ok(Json(ApiResponse::ok(orders)))
}

/// GET /api/v1/orders/:id/track
pub async fn track_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<TrackingInfo> {
    let info = state.services.orders.track_order(&user, order_id).await?;
    Ok(Json(ApiResponse::ok(info)))
}

/// PUT /api/v1/orders/:id/cancel
pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
) -> ApiResult<order::Model> {
    let cancelled = state
        .services
        .cancellations
        .cancel_order(&user, order_id)
        .await?;
    Ok(Json(ApiResponse::ok(cancelled)))
}

/// PUT /api/v1/orders/:id/delivery-status
pub async fn update_delivery_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<Uuid>,
    Json(request): Json<UpdateDeliveryStatusRequest>,
) -> ApiResult<order::Model> {
    let updated = state
        .services
        .orders
        .update_delivery_status(&user, order_id, request.status)
        .await?;
    Ok(Json(ApiResponse::ok(updated)))
}

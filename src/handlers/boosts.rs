use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::entities::spotlight_product;
use crate::services::boosts::{
    CreateBoostOrderRequest, CreateBoostOrderResponse, VerifyBoostRequest, VerifyBoostResponse,
};
use crate::{ApiResponse, ApiResult, AppState};

/// POST /api/v1/boosts
pub async fn create_boost_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateBoostOrderRequest>,
) -> ApiResult<CreateBoostOrderResponse> {
    let response = state
        .services
        .boosts
        .create_boost_order(&user, request)
        .await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// POST /api/v1/boosts/verify
pub async fn verify_boost_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<VerifyBoostRequest>,
) -> ApiResult<VerifyBoostResponse> {
    let response = state
        .services
        .boosts
        .verify_boost_payment(&user, request)
        .await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/v1/spotlight
pub async fn spotlight(State(state): State<AppState>) -> ApiResult<Vec<spotlight_product::Model>> {
    let rows = state.services.boosts.spotlight().await?;
    Ok(Json(ApiResponse::ok(rows)))
}

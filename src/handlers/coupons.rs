use axum::extract::State;
use axum::Json;

use crate::auth::AuthUser;
use crate::entities::coupon;
use crate::services::coupons::{CreateCouponRequest, RedeemCouponRequest, RedeemCouponResponse};
use crate::{ApiResponse, ApiResult, AppState};

/// POST /api/v1/coupons
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<CreateCouponRequest>,
) -> ApiResult<coupon::Model> {
    let created = state.services.coupons.create(&user, request).await?;
    Ok(Json(ApiResponse::ok(created)))
}

/// POST /api/v1/coupons/redeem
pub async fn redeem_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RedeemCouponRequest>,
) -> ApiResult<RedeemCouponResponse> {
    let response = state.services.coupons.redeem(&user, &request.code).await?;
    Ok(Json(ApiResponse::ok(response)))
}

/// GET /api/v1/coupons/mine
pub async fn list_my_coupons(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Vec<coupon::Model>> {
    let coupons = state.services.coupons.list_for_user(&user).await?;
    Ok(Json(ApiResponse::ok(coupons)))
}

use axum::extract::{Path, State};
use axum::Json;

use crate::services::settlement::VerificationOutcome;
use crate::{ApiResponse, ApiResult, AppState};

/// POST /api/v1/payments/verify/:transaction_id
///
/// Redirect/callback target for the payment gateway, so it carries no bearer
/// token. Safe to hit repeatedly; the settlement guard makes it idempotent.
pub async fn verify_payment(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<VerificationOutcome> {
    let outcome = state
        .services
        .settlements
        .verify_order_payment(&transaction_id)
        .await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

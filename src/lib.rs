use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod gateways;
pub mod handlers;
pub mod migrator;
pub mod scheduler;
pub mod services;

use config::AppConfig;
use errors::ServiceError;
use events::EventSender;
use services::AppServices;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub event_sender: EventSender,
    pub services: AppServices,
}

/// Body rendered for every successful request, mirroring the error envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ServiceError>;

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// All versioned API routes.
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/orders/checkout", post(handlers::orders::checkout))
        .route("/orders/purchases", get(handlers::orders::list_purchases))
        .route("/orders/sales", get(handlers::orders::list_sales))
        .route("/orders/:id", get(handlers::orders::get_order))
        .route("/orders/:id/track", get(handlers::orders::track_order))
        .route("/orders/:id/cancel", put(handlers::orders::cancel_order))
        .route(
            "/orders/:id/delivery-status",
            put(handlers::orders::update_delivery_status),
        )
        // Gateway callback target; unauthenticated by design of the redirect
        // flow, idempotent through the settlement guard.
        .route(
            "/payments/verify/:transaction_id",
            post(handlers::payments::verify_payment),
        )
        .route("/boosts", post(handlers::boosts::create_boost_order))
        .route("/boosts/verify", post(handlers::boosts::verify_boost_payment))
        .route("/spotlight", get(handlers::boosts::spotlight))
        .route("/coupons", post(handlers::coupons::create_coupon))
        .route("/coupons/redeem", post(handlers::coupons::redeem_coupon))
        .route("/coupons/mine", get(handlers::coupons::list_my_coupons))
        .route("/cart", get(handlers::carts::list_cart))
        .route(
            "/cart/:product_id",
            post(handlers::carts::add_to_cart).delete(handlers::carts::remove_from_cart),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/:id/read",
            put(handlers::notifications::mark_notification_read),
        )
}

/// Builds the full application router with middleware.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/v1", api_v1_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use loopwear_api::{
    app_router,
    auth::issue_token,
    config::AppConfig,
    db,
    entities::{address, product, user},
    events::{event_channel, run_event_logger},
    gateways::mock::{MockEmailSender, MockPaymentGateway, MockShippingAggregator},
    services::{AppServices, GatewaySet},
    AppState,
};

const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Harness spinning up the full router against a fresh SQLite database with
/// scriptable gateway doubles.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub payment: Arc<MockPaymentGateway>,
    pub shipping: Arc<MockShippingAggregator>,
    pub email: Arc<MockEmailSender>,
    _db_dir: TempDir,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_dir = TempDir::new().expect("create temp dir");
        let db_path = db_dir.path().join("loopwear_test.db");
        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection(&cfg)
            .await
            .expect("create test database");
        db::run_migrations(&pool).await.expect("run migrations");

        let payment = Arc::new(MockPaymentGateway::default());
        let shipping = Arc::new(MockShippingAggregator::default());
        let email = Arc::new(MockEmailSender::default());
        let gateways = GatewaySet {
            payment: payment.clone(),
            shipping: shipping.clone(),
            email: email.clone(),
        };

        let (event_sender, event_rx) = event_channel(256);
        let event_task = tokio::spawn(run_event_logger(event_rx));

        let pool = Arc::new(pool);
        let config = Arc::new(cfg);
        let services = AppServices::new(
            pool.clone(),
            config.clone(),
            gateways,
            event_sender.clone(),
        );
        let state = AppState {
            db: pool,
            config,
            event_sender,
            services,
        };
        let router = app_router(state.clone());

        Self {
            router,
            state,
            payment,
            shipping,
            email,
            _db_dir: db_dir,
            _event_task: event_task,
        }
    }

    pub fn token_for(&self, user_id: Uuid, role: &str) -> String {
        issue_token(
            &self.state.config.jwt_secret,
            3600,
            user_id,
            Some("Test User".to_string()),
            role,
        )
        .expect("issue token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {tok}"));
        }
        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("serialize request body"))
        } else {
            Body::empty()
        };
        let request = builder.body(body).expect("build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Seeds a verified, unblocked user. `with_pickup` fills the seller
    /// pickup address so fulfillment can dispatch.
    pub async fn seed_user(&self, name: &str, with_pickup: bool) -> user::Model {
        let pickup = |v: &str| {
            if with_pickup {
                Some(v.to_string())
            } else {
                None
            }
        };
        user::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            email: Set(format!("{}@example.com", name.to_lowercase().replace(' ', "."))),
            phone: Set(Some("9999999999".to_string())),
            phone_verified: Set(true),
            blocked: Set(false),
            balance: Set(Decimal::ZERO),
            total_sold: Set(0),
            pickup_line: Set(pickup("12 Market Lane")),
            pickup_city: Set(pickup("Pune")),
            pickup_state: Set(pickup("MH")),
            pickup_postal_code: Set(pickup("411001")),
            pickup_country: Set(pickup("India")),
            created_at: Set(Utc::now()),
            updated_at: Set(None),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed user")
    }

    pub async fn seed_address(&self, user_id: Uuid) -> address::Model {
        address::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            recipient_name: Set("Recipient".to_string()),
            phone: Set("8888888888".to_string()),
            line1: Set("44 Rose Street".to_string()),
            line2: Set(None),
            city: Set("Mumbai".to_string()),
            state: Set("MH".to_string()),
            postal_code: Set("400001".to_string()),
            country: Set("India".to_string()),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed address")
    }

    pub async fn seed_product(&self, seller_id: Uuid, title: &str, price: Decimal) -> product::Model {
        product::ActiveModel {
            id: Set(Uuid::new_v4()),
            seller_id: Set(seller_id),
            title: Set(title.to_string()),
            description: Set(None),
            price: Set(price),
            sold_status: Set(false),
            created_at: Set(Utc::now()),
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("seed product")
    }
}

/// Reads a response body as JSON.
pub async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("parse body json")
}

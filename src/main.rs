use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use loopwear_api::config::load_config;
use loopwear_api::events::{event_channel, run_event_logger};
use loopwear_api::gateways::email::HttpEmailSender;
use loopwear_api::gateways::payment::HttpPaymentGateway;
use loopwear_api::gateways::shipping::HttpShippingAggregator;
use loopwear_api::scheduler::{BoostExpirySweep, Scheduler, StaleCartReminder};
use loopwear_api::services::{AppServices, GatewaySet};
use loopwear_api::{app_router, db, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = load_config().context("failed to load configuration")?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone()));
    if config.log_json {
        tracing_subscriber::fmt().with_env_filter(filter).json().init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    let config = Arc::new(config);
    let pool = db::establish_connection(&config).await?;
    if config.auto_migrate {
        db::run_migrations(&pool).await?;
    }
    db::check_connection(&pool).await?;
    let pool = Arc::new(pool);

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(20))
        .build()
        .context("failed to build HTTP client")?;
    let gateways = GatewaySet {
        payment: Arc::new(HttpPaymentGateway::new(
            http.clone(),
            config.payment_gateway.clone(),
        )),
        shipping: Arc::new(HttpShippingAggregator::new(
            http.clone(),
            config.shipping.clone(),
        )),
        email: Arc::new(HttpEmailSender::new(http, config.mail.clone())),
    };

    let (event_sender, event_rx) = event_channel(1024);
    tokio::spawn(run_event_logger(event_rx));

    let services = AppServices::new(
        pool.clone(),
        config.clone(),
        gateways,
        event_sender.clone(),
    );

    let sweep_interval = Duration::from_secs(config.sweep_interval_secs);
    let mut scheduler = Scheduler::new();
    scheduler.register(Arc::new(BoostExpirySweep::new(
        services.boosts.clone(),
        sweep_interval,
    )));
    scheduler.register(Arc::new(StaleCartReminder::new(
        services.carts.clone(),
        sweep_interval,
    )));
    scheduler.start();

    let state = AppState {
        db: pool,
        config: config.clone(),
        event_sender,
        services,
    };
    let app = app_router(state);

    let addr = config.server_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "server listening");
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

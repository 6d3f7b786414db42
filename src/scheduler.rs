use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::errors::ServiceError;
use crate::services::{BoostService, CartService};

/// A periodic background job. Tasks are registered with the scheduler at
/// startup and can also be run directly, which is how the tests drive them.
#[async_trait]
pub trait ScheduledTask: Send + Sync {
    fn name(&self) -> &'static str;
    fn interval(&self) -> Duration;
    async fn run(&self) -> Result<(), ServiceError>;
}

/// Spawns one interval loop per registered task. A failing run is logged and
/// the loop keeps going.
#[derive(Default)]
pub struct Scheduler {
    tasks: Vec<Arc<dyn ScheduledTask>>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, task: Arc<dyn ScheduledTask>) {
        self.tasks.push(task);
    }

    pub fn start(self) -> Vec<JoinHandle<()>> {
        self.tasks
            .into_iter()
            .map(|task| {
                tokio::spawn(async move {
                    let mut ticker = tokio::time::interval(task.interval());
                    // First tick fires immediately; skip it so a fresh boot
                    // does not sweep before the server is up.
                    ticker.tick().await;
                    info!(task = task.name(), "scheduled task started");
                    loop {
                        ticker.tick().await;
                        if let Err(e) = task.run().await {
                            error!(task = task.name(), "scheduled task failed: {}", e);
                        }
                    }
                })
            })
            .collect()
    }
}

/// Deletes boosts past their end date and pulls their products out of the
/// spotlight.
pub struct BoostExpirySweep {
    boosts: Arc<BoostService>,
    interval: Duration,
}

impl BoostExpirySweep {
    pub fn new(boosts: Arc<BoostService>, interval: Duration) -> Self {
        Self { boosts, interval }
    }
}

#[async_trait]
impl ScheduledTask for BoostExpirySweep {
    fn name(&self) -> &'static str {
        "boost_expiry_sweep"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<(), ServiceError> {
        self.boosts.expire_boosts().await?;
        Ok(())
    }
}

/// Reminds users about cart items that have been sitting past the window.
pub struct StaleCartReminder {
    carts: Arc<CartService>,
    interval: Duration,
}

impl StaleCartReminder {
    pub fn new(carts: Arc<CartService>, interval: Duration) -> Self {
        Self { carts, interval }
    }
}

#[async_trait]
impl ScheduledTask for StaleCartReminder {
    fn name(&self) -> &'static str {
        "stale_cart_reminder"
    }

    fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(&self) -> Result<(), ServiceError> {
        self.carts.remind_stale_carts().await?;
        Ok(())
    }
}

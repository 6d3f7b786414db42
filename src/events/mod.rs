use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Domain events emitted by the services after their database work commits.
/// Consumers run out of band; losing an event never affects stored state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    OrderCreated {
        order_id: Uuid,
        buyer_id: Uuid,
        transaction_id: String,
    },
    PaymentSettled {
        transaction_id: String,
        order_ids: Vec<Uuid>,
    },
    PaymentFailed {
        transaction_id: String,
    },
    OrderCancelled {
        order_id: Uuid,
        refunded: bool,
    },
    DeliveryStatusChanged {
        order_id: Uuid,
        status: String,
    },
    ShipmentCreated {
        order_id: Uuid,
        shipment_id: String,
    },
    BoostActivated {
        boost_id: Uuid,
        seller_id: Uuid,
    },
    BoostExpired {
        boost_id: Uuid,
    },
    CouponIssued {
        coupon_id: Uuid,
        user_id: Uuid,
    },
    CouponRedeemed {
        coupon_id: Uuid,
        user_id: Uuid,
    },
}

pub type EventReceiver = mpsc::Receiver<Event>;

/// Cloneable handle for publishing events onto the shared channel.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<Event>,
}

impl EventSender {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Best effort publish. A full or closed channel is logged and dropped.
    pub async fn send(&self, event: Event) {
        if let Err(e) = self.tx.send(event).await {
            error!("failed to publish event: {}", e);
        }
    }
}

/// Creates the event channel with a bounded buffer.
pub fn event_channel(buffer: usize) -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::channel(buffer);
    (EventSender::new(tx), rx)
}

/// Drains the event channel and logs each event. Runs until every sender is
/// dropped. Spawned once at startup.
pub async fn run_event_logger(mut rx: EventReceiver) {
    info!("event logger started");
    while let Some(event) = rx.recv().await {
        match serde_json::to_string(&event) {
            Ok(json) => debug!(event = %json, "domain event"),
            Err(e) => error!("failed to serialize event: {}", e),
        }
    }
    info!("event logger stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_channel() {
        let (sender, mut rx) = event_channel(8);
        sender
            .send(Event::PaymentFailed {
                transaction_id: "TXN-1".into(),
            })
            .await;
        match rx.recv().await {
            Some(Event::PaymentFailed { transaction_id }) => {
                assert_eq!(transaction_id, "TXN-1");
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = Event::BoostExpired {
            boost_id: Uuid::nil(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "boost_expired");
    }
}

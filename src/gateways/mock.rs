//! Scriptable in-memory gateway doubles used by the integration tests.

use async_trait::async_trait;
use std::sync::Mutex;

use crate::errors::ServiceError;

use super::{
    EmailSender, InitiatedPayment, PaymentGateway, RefundOutcome, SettlementStatus,
    ShipmentDetails, ShipmentRequest, ShippingAggregator, TrackingInfo,
};

/// Payment gateway double. Scripted responses, recorded calls.
pub struct MockPaymentGateway {
    pub status: Mutex<SettlementStatus>,
    pub refund_outcome: Mutex<RefundOutcome>,
    pub fail_initiation: Mutex<bool>,
    pub initiated: Mutex<Vec<(String, i64)>>,
    pub status_checks: Mutex<Vec<String>>,
    pub refunds: Mutex<Vec<(String, i64)>>,
}

impl Default for MockPaymentGateway {
    fn default() -> Self {
        Self {
            status: Mutex::new(SettlementStatus::Completed {
                payment_mode: Some("UPI".to_string()),
            }),
            refund_outcome: Mutex::new(RefundOutcome::Accepted),
            fail_initiation: Mutex::new(false),
            initiated: Mutex::new(Vec::new()),
            status_checks: Mutex::new(Vec::new()),
            refunds: Mutex::new(Vec::new()),
        }
    }
}

impl MockPaymentGateway {
    pub fn set_status(&self, status: SettlementStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn set_refund_outcome(&self, outcome: RefundOutcome) {
        *self.refund_outcome.lock().unwrap() = outcome;
    }

    pub fn fail_next_initiation(&self) {
        *self.fail_initiation.lock().unwrap() = true;
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn initiate_payment(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<InitiatedPayment, ServiceError> {
        if std::mem::take(&mut *self.fail_initiation.lock().unwrap()) {
            return Err(ServiceError::PaymentFailed(
                "Payment gateway rejected the transaction".to_string(),
            ));
        }
        self.initiated
            .lock()
            .unwrap()
            .push((transaction_id.to_string(), amount_minor));
        Ok(InitiatedPayment {
            transaction_id: transaction_id.to_string(),
            redirect_url: format!("https://gw.test/pay/{transaction_id}"),
        })
    }

    async fn check_status(&self, transaction_id: &str) -> Result<SettlementStatus, ServiceError> {
        self.status_checks
            .lock()
            .unwrap()
            .push(transaction_id.to_string());
        Ok(self.status.lock().unwrap().clone())
    }

    async fn refund(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<RefundOutcome, ServiceError> {
        self.refunds
            .lock()
            .unwrap()
            .push((transaction_id.to_string(), amount_minor));
        Ok(self.refund_outcome.lock().unwrap().clone())
    }
}

/// Shipping aggregator double.
pub struct MockShippingAggregator {
    pub fail_cancellation: Mutex<bool>,
    pub created: Mutex<Vec<ShipmentRequest>>,
    pub cancelled: Mutex<Vec<String>>,
}

impl Default for MockShippingAggregator {
    fn default() -> Self {
        Self {
            fail_cancellation: Mutex::new(false),
            created: Mutex::new(Vec::new()),
            cancelled: Mutex::new(Vec::new()),
        }
    }
}

impl MockShippingAggregator {
    pub fn fail_next_cancellation(&self) {
        *self.fail_cancellation.lock().unwrap() = true;
    }
}

#[async_trait]
impl ShippingAggregator for MockShippingAggregator {
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<ShipmentDetails, ServiceError> {
        self.created.lock().unwrap().push(request.clone());
        Ok(ShipmentDetails {
            shipment_id: format!("SHIP-{}", request.order_id),
            awb_code: Some("AWB123".to_string()),
            tracking_url: Some("https://courier.test/track/AWB123".to_string()),
            label_url: Some("https://courier.test/label/AWB123".to_string()),
            status: "NEW".to_string(),
        })
    }

    async fn cancel_shipment(&self, shipment_id: &str) -> Result<(), ServiceError> {
        if std::mem::take(&mut *self.fail_cancellation.lock().unwrap()) {
            return Err(ServiceError::ExternalServiceError(
                "Shipment cancellation rejected".to_string(),
            ));
        }
        self.cancelled.lock().unwrap().push(shipment_id.to_string());
        Ok(())
    }

    async fn track_by_awb(&self, awb_code: &str) -> Result<TrackingInfo, ServiceError> {
        Ok(TrackingInfo {
            awb_code: awb_code.to_string(),
            status: "IN TRANSIT".to_string(),
            expected_delivery: None,
        })
    }
}

/// Email double recording each message.
#[derive(Default)]
pub struct MockEmailSender {
    pub sent: Mutex<Vec<(String, String)>>,
}

#[async_trait]
impl EmailSender for MockEmailSender {
    async fn send(&self, to: &str, subject: &str, _body: &str) -> Result<(), ServiceError> {
        self.sent
            .lock()
            .unwrap()
            .push((to.to_string(), subject.to_string()));
        Ok(())
    }
}

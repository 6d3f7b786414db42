use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ServiceError;

pub mod email;
pub mod mock;
pub mod payment;
pub mod shipping;

/// Result of initiating a payment with the gateway. The redirect URL is handed
/// back to the client, which completes the payment on the gateway's page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiatedPayment {
    pub transaction_id: String,
    pub redirect_url: String,
}

/// Terminal or pending state of a gateway transaction, as reported by the
/// gateway's status endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    Completed { payment_mode: Option<String> },
    Pending,
    Failed,
}

impl SettlementStatus {
    pub fn is_completed(&self) -> bool {
        matches!(self, SettlementStatus::Completed { .. })
    }
}

/// Outcome of a refund request against the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefundOutcome {
    Accepted,
    Rejected,
}

/// Everything the aggregator needs to book a pickup and delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentRequest {
    pub order_id: String,
    pub product_title: String,
    pub amount_minor: i64,
    pub pickup_name: String,
    pub pickup_line: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub pickup_postal_code: String,
    pub pickup_country: String,
    pub recipient_name: String,
    pub recipient_phone: String,
    pub delivery_line: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_postal_code: String,
    pub delivery_country: String,
    pub weight_kg: f64,
    pub length_cm: u32,
    pub width_cm: u32,
    pub height_cm: u32,
}

/// Carrier tracking snapshot for an AWB (air waybill) code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackingInfo {
    pub awb_code: String,
    pub status: String,
    pub expected_delivery: Option<String>,
}

/// Identifiers returned by the aggregator once a shipment is booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentDetails {
    pub shipment_id: String,
    pub awb_code: Option<String>,
    pub tracking_url: Option<String>,
    pub label_url: Option<String>,
    pub status: String,
}

/// Payment gateway seam. The HTTP implementation talks to the real gateway;
/// tests swap in a scriptable mock.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a transaction with the gateway and returns the page the
    /// client must be redirected to.
    async fn initiate_payment(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<InitiatedPayment, ServiceError>;

    /// Server-to-server status check for a previously initiated transaction.
    async fn check_status(&self, transaction_id: &str) -> Result<SettlementStatus, ServiceError>;

    /// Requests a refund of the full captured amount.
    async fn refund(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<RefundOutcome, ServiceError>;
}

/// Shipping aggregator seam for booking and cancelling shipments.
#[async_trait]
pub trait ShippingAggregator: Send + Sync {
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<ShipmentDetails, ServiceError>;

    async fn cancel_shipment(&self, shipment_id: &str) -> Result<(), ServiceError>;

    async fn track_by_awb(&self, awb_code: &str) -> Result<TrackingInfo, ServiceError>;
}

/// Outbound email seam. Delivery is always best effort.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError>;
}

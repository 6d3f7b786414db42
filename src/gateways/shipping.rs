use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::ShippingConfig;
use crate::errors::ServiceError;

use super::{ShipmentDetails, ShipmentRequest, ShippingAggregator, TrackingInfo};

/// Aggregator client. Authenticates with email/password for a bearer token and
/// caches it; a 401 on any call drops the cache so the next call re-logs-in.
pub struct HttpShippingAggregator {
    client: Client,
    config: ShippingConfig,
    token: RwLock<Option<String>>,
}

impl HttpShippingAggregator {
    pub fn new(client: Client, config: ShippingConfig) -> Self {
        Self {
            client,
            config,
            token: RwLock::new(None),
        }
    }

    async fn auth_token(&self) -> Result<String, ServiceError> {
        if let Some(token) = self.token.read().await.clone() {
            return Ok(token);
        }
        let response = self
            .client
            .post(format!("{}/auth/login", self.config.base_url))
            .json(&json!({
                "email": self.config.api_email,
                "password": self.config.api_password,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Shipping aggregator login failed with HTTP {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        let token = body
            .pointer("/token")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "Shipping aggregator returned no token".to_string(),
                )
            })?
            .to_string();
        *self.token.write().await = Some(token.clone());
        Ok(token)
    }
}

#[async_trait]
impl ShippingAggregator for HttpShippingAggregator {
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    async fn create_shipment(
        &self,
        request: &ShipmentRequest,
    ) -> Result<ShipmentDetails, ServiceError> {
        let token = self.auth_token().await?;
        let response = self
            .client
            .post(format!("{}/orders/create/adhoc", self.config.base_url))
            .bearer_auth(&token)
            .json(&json!({
                "order_id": request.order_id,
                "order_items": [{
                    "name": request.product_title,
                    "units": 1,
                    "selling_price": request.amount_minor,
                }],
                "pickup_customer_name": request.pickup_name,
                "pickup_address": request.pickup_line,
                "pickup_city": request.pickup_city,
                "pickup_state": request.pickup_state,
                "pickup_pincode": request.pickup_postal_code,
                "pickup_country": request.pickup_country,
                "shipping_customer_name": request.recipient_name,
                "shipping_phone": request.recipient_phone,
                "shipping_address": request.delivery_line,
                "shipping_city": request.delivery_city,
                "shipping_state": request.delivery_state,
                "shipping_pincode": request.delivery_postal_code,
                "shipping_country": request.delivery_country,
                "weight": request.weight_kg,
                "length": request.length_cm,
                "breadth": request.width_cm,
                "height": request.height_cm,
            }))
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            *self.token.write().await = None;
            warn!("shipping aggregator token expired");
            return Err(ServiceError::ExternalServiceError(
                "Shipping aggregator session expired".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Shipment booking failed with HTTP {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let shipment_id = body
            .pointer("/shipment_id")
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "Shipping aggregator returned no shipment id".to_string(),
                )
            })?;
        let details = ShipmentDetails {
            shipment_id,
            awb_code: body
                .pointer("/awb_code")
                .and_then(Value::as_str)
                .map(str::to_string),
            tracking_url: body
                .pointer("/tracking_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            label_url: body
                .pointer("/label_url")
                .and_then(Value::as_str)
                .map(str::to_string),
            status: body
                .pointer("/status")
                .and_then(Value::as_str)
                .unwrap_or("NEW")
                .to_string(),
        };
        info!(shipment_id = %details.shipment_id, "shipment booked");
        Ok(details)
    }

    #[instrument(skip(self))]
    async fn cancel_shipment(&self, shipment_id: &str) -> Result<(), ServiceError> {
        let token = self.auth_token().await?;
        let response = self
            .client
            .post(format!("{}/orders/cancel/shipment", self.config.base_url))
            .bearer_auth(&token)
            .json(&json!({ "ids": [shipment_id] }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Shipment cancellation failed with HTTP {}",
                response.status()
            )));
        }
        info!(%shipment_id, "shipment cancelled");
        Ok(())
    }

    #[instrument(skip(self))]
    async fn track_by_awb(&self, awb_code: &str) -> Result<TrackingInfo, ServiceError> {
        let token = self.auth_token().await?;
        let response = self
            .client
            .get(format!(
                "{}/courier/track/awb/{}",
                self.config.base_url, awb_code
            ))
            .bearer_auth(&token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Tracking lookup failed with HTTP {}",
                response.status()
            )));
        }
        let body: Value = response.json().await?;
        Ok(TrackingInfo {
            awb_code: awb_code.to_string(),
            status: body
                .pointer("/tracking_data/shipment_status")
                .and_then(Value::as_str)
                .unwrap_or("UNKNOWN")
                .to_string(),
            expected_delivery: body
                .pointer("/tracking_data/etd")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

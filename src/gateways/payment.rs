use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use tracing::{error, info, instrument};
use uuid::Uuid;

use crate::config::PaymentGatewayConfig;
use crate::errors::ServiceError;

use super::{InitiatedPayment, PaymentGateway, RefundOutcome, SettlementStatus};

const PAY_PATH: &str = "/pg/v1/pay";
const STATUS_PATH_PREFIX: &str = "/pg/v1/status";
const REFUND_PATH: &str = "/pg/v1/refund";

/// Gateway client. Every call carries an `X-VERIFY` checksum derived from the
/// request payload (or path, for status checks) and the merchant salt key.
pub struct HttpPaymentGateway {
    client: Client,
    config: PaymentGatewayConfig,
}

impl HttpPaymentGateway {
    pub fn new(client: Client, config: PaymentGatewayConfig) -> Self {
        Self { client, config }
    }

    fn checksum(&self, material: &str) -> String {
        let digest = Sha256::digest(format!("{}{}", material, self.config.salt_key).as_bytes());
        format!("{}###{}", hex::encode(digest), self.config.salt_index)
    }

    fn encode_payload(&self, payload: &Value) -> (String, String) {
        let encoded = base64::engine::general_purpose::STANDARD.encode(payload.to_string());
        let checksum = self.checksum(&format!("{}{}", encoded, PAY_PATH));
        (encoded, checksum)
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    #[instrument(skip(self))]
    async fn initiate_payment(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<InitiatedPayment, ServiceError> {
        let callback_url = format!(
            "{}/api/v1/payments/verify/{}",
            self.config.callback_base_url, transaction_id
        );
        let payload = json!({
            "merchantId": self.config.merchant_id,
            "merchantTransactionId": transaction_id,
            "amount": amount_minor,
            "redirectUrl": callback_url,
            "redirectMode": "POST",
            "callbackUrl": callback_url,
            "paymentInstrument": { "type": "PAY_PAGE" },
        });
        let (encoded, checksum) = self.encode_payload(&payload);

        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, PAY_PATH))
            .header("X-VERIFY", checksum)
            .json(&json!({ "request": encoded }))
            .send()
            .await?;

        if !response.status().is_success() {
            error!(status = %response.status(), "payment initiation rejected");
            return Err(ServiceError::PaymentFailed(
                "Payment gateway rejected the transaction".to_string(),
            ));
        }

        let body: Value = response.json().await?;
        let redirect_url = body
            .pointer("/data/instrumentResponse/redirectInfo/url")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                ServiceError::ExternalServiceError(
                    "Payment gateway returned no redirect URL".to_string(),
                )
            })?
            .to_string();

        info!(%transaction_id, "payment initiated");
        Ok(InitiatedPayment {
            transaction_id: transaction_id.to_string(),
            redirect_url,
        })
    }

    #[instrument(skip(self))]
    async fn check_status(&self, transaction_id: &str) -> Result<SettlementStatus, ServiceError> {
        let path = format!(
            "{}/{}/{}",
            STATUS_PATH_PREFIX, self.config.merchant_id, transaction_id
        );
        let checksum = self.checksum(&path);

        let response = self
            .client
            .get(format!("{}{}", self.config.base_url, path))
            .header("X-VERIFY", checksum)
            .header("X-MERCHANT-ID", &self.config.merchant_id)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Payment status check failed with HTTP {}",
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        let code = body
            .pointer("/code")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let status = match code {
            "PAYMENT_SUCCESS" => SettlementStatus::Completed {
                payment_mode: body
                    .pointer("/data/paymentInstrument/type")
                    .and_then(Value::as_str)
                    .map(str::to_string),
            },
            "PAYMENT_PENDING" => SettlementStatus::Pending,
            _ => SettlementStatus::Failed,
        };
        info!(%transaction_id, ?status, "payment status checked");
        Ok(status)
    }

    #[instrument(skip(self))]
    async fn refund(
        &self,
        transaction_id: &str,
        amount_minor: i64,
    ) -> Result<RefundOutcome, ServiceError> {
        let payload = json!({
            "merchantId": self.config.merchant_id,
            "merchantTransactionId": format!("RF-{}", Uuid::new_v4().simple()),
            "originalTransactionId": transaction_id,
            "amount": amount_minor,
        });
        let encoded = base64::engine::general_purpose::STANDARD.encode(payload.to_string());
        let checksum = self.checksum(&format!("{}{}", encoded, REFUND_PATH));

        let response = self
            .client
            .post(format!("{}{}", self.config.base_url, REFUND_PATH))
            .header("X-VERIFY", checksum)
            .json(&json!({ "request": encoded }))
            .send()
            .await?;

        if !response.status().is_success() {
            error!(status = %response.status(), %transaction_id, "refund rejected");
            return Ok(RefundOutcome::Rejected);
        }

        let body: Value = response.json().await?;
        let accepted = body
            .pointer("/success")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        if accepted {
            info!(%transaction_id, "refund accepted");
            Ok(RefundOutcome::Accepted)
        } else {
            Ok(RefundOutcome::Rejected)
        }
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{info, instrument};

use crate::config::MailConfig;
use crate::errors::ServiceError;

use super::EmailSender;

/// Transactional mail over the provider's HTTP API.
pub struct HttpEmailSender {
    client: Client,
    config: MailConfig,
}

impl HttpEmailSender {
    pub fn new(client: Client, config: MailConfig) -> Self {
        Self { client, config }
    }
}

#[async_trait]
impl EmailSender for HttpEmailSender {
    #[instrument(skip(self, body))]
    async fn send(&self, to: &str, subject: &str, body: &str) -> Result<(), ServiceError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .bearer_auth(&self.config.api_key)
            .json(&json!({
                "from": { "email": self.config.from_address },
                "to": [{ "email": to }],
                "subject": subject,
                "html": body,
            }))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ServiceError::ExternalServiceError(format!(
                "Mail provider responded with HTTP {}",
                response.status()
            )));
        }
        info!(%to, %subject, "email dispatched");
        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::SmsGateway;
use crate::config::SmsGatewayConfig;
use crate::shared::{HelpdeskError, Result};

#[derive(Debug, Serialize)]
struct SmsMessage<'a> {
    sender: &'a str,
    to: &'a str,
    message: &'a str,
}

/// JSON-over-HTTP SMS provider (`POST {base_url}/sms`).
pub struct HttpSmsGateway {
    config: SmsGatewayConfig,
    client: Client,
}

impl HttpSmsGateway {
    pub fn new(config: SmsGatewayConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HelpdeskError::Configuration {
                message: format!("Failed to build SMS HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl SmsGateway for HttpSmsGateway {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()> {
        let payload = SmsMessage {
            sender: &self.config.sender_id,
            to,
            message,
        };

        let response = self
            .client
            .post(format!("{}/sms", self.config.base_url.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("SMS gateway returned {}: {}", status, body);
            return Err(HelpdeskError::ExternalService {
                service: "SMS".to_string(),
                message: format!("SMS gateway returned error {}", status),
            });
        }

        info!("SMS sent to {}", to);
        Ok(())
    }
}

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use super::EmailGateway;
use crate::config::EmailGatewayConfig;
use crate::shared::{HelpdeskError, Result};

#[derive(Debug, Serialize)]
struct EmailMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// JSON-over-HTTP mail provider (`POST {base_url}/messages`).
pub struct HttpEmailGateway {
    config: EmailGatewayConfig,
    client: Client,
}

impl HttpEmailGateway {
    pub fn new(config: EmailGatewayConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| HelpdeskError::Configuration {
                message: format!("Failed to build email HTTP client: {}", e),
            })?;
        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmailGateway for HttpEmailGateway {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()> {
        let message = EmailMessage {
            from: &self.config.from_address,
            to,
            subject,
            text: body,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&message)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Email gateway returned {}: {}", status, body);
            return Err(HelpdeskError::ExternalService {
                service: "Email".to_string(),
                message: format!("Email gateway returned error {}", status),
            });
        }

        info!("Email sent to {}", to);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn gateway(base_url: String) -> HttpEmailGateway {
        HttpEmailGateway::new(
            EmailGatewayConfig {
                base_url,
                api_key: "mail-key".to_string(),
                from_address: "support@helpdesk.local".to_string(),
            },
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn posts_message_with_bearer_key() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/messages")
                    .header("authorization", "Bearer mail-key")
                    .json_body(json!({
                        "from": "support@helpdesk.local",
                        "to": "ada@example.com",
                        "subject": "Welcome",
                        "text": "Hello"
                    }));
                then.status(202);
            })
            .await;

        gateway(server.base_url())
            .send_email("ada@example.com", "Welcome", "Hello")
            .await
            .unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn non_success_status_is_an_external_service_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/messages");
                then.status(500).body("mailbox exploded");
            })
            .await;

        let err = gateway(server.base_url())
            .send_email("ada@example.com", "Welcome", "Hello")
            .await
            .unwrap_err();
        assert!(matches!(err, HelpdeskError::ExternalService { .. }));
        assert!(err.is_retryable());
    }
}

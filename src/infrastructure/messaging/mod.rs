pub mod email_gateway;
pub mod notification_dispatcher;
pub mod sms_gateway;

use async_trait::async_trait;
use tracing::info;

use crate::shared::Result;

pub use email_gateway::HttpEmailGateway;
pub use notification_dispatcher::NotificationDispatcher;
pub use sms_gateway::HttpSmsGateway;

/// Delivery port for email. Addresses are validated before they reach it.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send_email(&self, to: &str, subject: &str, body: &str) -> Result<()>;
}

/// Delivery port for SMS. Numbers arrive in E.164 form.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send_sms(&self, to: &str, message: &str) -> Result<()>;
}

/// Writes outbound messages to the log instead of delivering them.
/// Used for any channel without a configured gateway URL.
#[derive(Debug, Clone, Default)]
pub struct LoggingGateway;

#[async_trait]
impl EmailGateway for LoggingGateway {
    async fn send_email(&self, to: &str, subject: &str, _body: &str) -> Result<()> {
        info!(channel = "email", to, subject, "Email delivery skipped, no gateway configured");
        Ok(())
    }
}

#[async_trait]
impl SmsGateway for LoggingGateway {
    async fn send_sms(&self, to: &str, _message: &str) -> Result<()> {
        info!(channel = "sms", to, "SMS delivery skipped, no gateway configured");
        Ok(())
    }
}

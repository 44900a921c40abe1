use async_trait::async_trait;
use serde::Serialize;

use crate::shared::Result;

/// Outbound notifications, independent of the delivery channel.
///
/// Every call resolves once delivery has succeeded or failed.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationService: Send + Sync {
    async fn notify_ticket_assigned(&self, ticket_id: &str, agent_id: &str) -> Result<()>;
    async fn notify_ticket_updated(&self, ticket_id: &str, updated_by: &str) -> Result<()>;
    async fn notify_new_response(&self, ticket_id: &str, responder_id: &str) -> Result<()>;
    async fn notify_ticket_resolved(&self, ticket_id: &str) -> Result<()>;
    async fn notify_ticket_overdue(&self, ticket_id: &str) -> Result<()>;
    async fn send_welcome(&self, user_id: &str) -> Result<()>;
    async fn notify_ticket_escalated(&self, ticket_id: &str, escalated_to: &str) -> Result<()>;

    /// Attempts every recipient. Per-recipient failures land in the report;
    /// only an unusable request (nothing to send) is an error.
    async fn send_bulk_notification(
        &self,
        user_ids: &[String],
        subject: &str,
        message: &str,
    ) -> Result<BulkDispatchReport>;

    async fn send_email_notification(&self, address: &str, subject: &str, message: &str) -> Result<()>;
    async fn send_sms_notification(&self, phone_number: &str, message: &str) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailure {
    pub user_id: String,
    pub reason: String,
}

/// Outcome of a bulk send, in recipient order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BulkDispatchReport {
    pub delivered: Vec<String>,
    pub failed: Vec<DeliveryFailure>,
}

impl BulkDispatchReport {
    pub fn success_count(&self) -> usize {
        self.delivered.len()
    }

    pub fn failure_count(&self) -> usize {
        self.failed.len()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn record(&mut self, user_id: String, outcome: Result<()>) {
        match outcome {
            Ok(()) => self.delivered.push(user_id),
            Err(e) => self.failed.push(DeliveryFailure {
                user_id,
                reason: e.to_string(),
            }),
        }
    }
}

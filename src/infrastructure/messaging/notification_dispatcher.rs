use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use metrics::counter;
use tracing::{debug, info, warn};
use validator::ValidateEmail;

use super::{EmailGateway, SmsGateway};
use crate::domain::entities::{Ticket, User, UserRole};
use crate::domain::repositories::{TicketRepository, UserRepository};
use crate::domain::services::{BulkDispatchReport, NotificationService};
use crate::shared::types::PhoneNumber;
use crate::shared::{HelpdeskError, Result};

/// [`NotificationService`] that resolves recipients through the repositories
/// and hands messages to the email and SMS gateways.
pub struct NotificationDispatcher {
    users: Arc<dyn UserRepository>,
    tickets: Arc<dyn TicketRepository>,
    email: Arc<dyn EmailGateway>,
    sms: Arc<dyn SmsGateway>,
    bulk_concurrency: usize,
}

impl NotificationDispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        tickets: Arc<dyn TicketRepository>,
        email: Arc<dyn EmailGateway>,
        sms: Arc<dyn SmsGateway>,
        bulk_concurrency: usize,
    ) -> Self {
        Self {
            users,
            tickets,
            email,
            sms,
            bulk_concurrency: bulk_concurrency.max(1),
        }
    }

    async fn load_ticket(&self, ticket_id: &str) -> Result<Ticket> {
        self.tickets
            .get_by_id(ticket_id)
            .await?
            .ok_or_else(|| HelpdeskError::not_found(format!("Ticket {}", ticket_id)))
    }

    async fn load_user(&self, user_id: &str) -> Result<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| HelpdeskError::not_found(format!("User {}", user_id)))
    }

    async fn email_user(&self, user: &User, subject: &str, body: &str) -> Result<()> {
        if !user.is_active {
            return Err(HelpdeskError::business_rule(format!(
                "User {} is inactive",
                user.id
            )));
        }
        self.send_email_notification(&user.email, subject, body).await
    }

    async fn sms_user(&self, user: &User, message: &str) -> Result<()> {
        match &user.phone {
            Some(phone) if user.is_active => self.send_sms_notification(phone.as_str(), message).await,
            _ => Ok(()),
        }
    }

    /// Emails every listed user. Missing or inactive users are skipped; the
    /// first delivery error is returned after all recipients were attempted.
    async fn email_users(&self, user_ids: &[String], subject: &str, body: &str) -> Result<()> {
        let mut first_error = None;
        for user_id in user_ids {
            let user = match self.users.get_by_id(user_id).await? {
                Some(user) if user.is_active => user,
                _ => {
                    debug!("Skipping notification for unavailable user {}", user_id);
                    continue;
                }
            };
            if let Err(e) = self.email_user(&user, subject, body).await {
                warn!("Email to user {} failed: {}", user_id, e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    async fn deliver_bulk(&self, user_id: &str, subject: &str, message: &str) -> Result<()> {
        let user = self.load_user(user_id).await?;
        self.email_user(&user, subject, message).await
    }
}

#[async_trait]
impl NotificationService for NotificationDispatcher {
    async fn notify_ticket_assigned(&self, ticket_id: &str, agent_id: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        let agent = self.load_user(agent_id).await?;
        self.email_user(
            &agent,
            &format!("Ticket assigned: {}", ticket.subject),
            &format!(
                "Ticket {} ({:?} priority) has been assigned to you.",
                ticket.id, ticket.priority
            ),
        )
        .await
    }

    async fn notify_ticket_updated(&self, ticket_id: &str, updated_by: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        self.email_users(
            &ticket.participants_except(updated_by),
            &format!("Ticket updated: {}", ticket.subject),
            &format!("Ticket {} is now {:?}.", ticket.id, ticket.status),
        )
        .await
    }

    async fn notify_new_response(&self, ticket_id: &str, responder_id: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        self.email_users(
            &ticket.participants_except(responder_id),
            &format!("New response on: {}", ticket.subject),
            &format!("There is a new response on ticket {}.", ticket.id),
        )
        .await
    }

    async fn notify_ticket_resolved(&self, ticket_id: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        self.email_users(
            &[ticket.customer_id.clone()],
            &format!("Ticket resolved: {}", ticket.subject),
            &format!("Ticket {} has been resolved.", ticket.id),
        )
        .await
    }

    async fn notify_ticket_overdue(&self, ticket_id: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        let recipients = match &ticket.assignee_id {
            Some(assignee) => vec![assignee.clone()],
            None => self
                .users
                .get_by_role(&ticket.organization_id, UserRole::Admin)
                .await?
                .into_iter()
                .map(|admin| admin.id)
                .collect(),
        };
        if recipients.is_empty() {
            warn!("Overdue ticket {} has nobody to notify", ticket.id);
            return Ok(());
        }

        self.email_users(
            &recipients,
            &format!("Ticket overdue: {}", ticket.subject),
            &format!("Ticket {} is past its due time.", ticket.id),
        )
        .await
    }

    async fn send_welcome(&self, user_id: &str) -> Result<()> {
        let user = self.load_user(user_id).await?;
        let email = self
            .email_user(
                &user,
                "Welcome to the helpdesk",
                &format!("Hello {}, your account is ready.", user.full_name),
            )
            .await;
        let sms = self.sms_user(&user, "Your helpdesk account is ready.").await;

        // Both channels are attempted; the email error wins.
        email.and(sms)
    }

    async fn notify_ticket_escalated(&self, ticket_id: &str, escalated_to: &str) -> Result<()> {
        let ticket = self.load_ticket(ticket_id).await?;
        let target = self.load_user(escalated_to).await?;
        let summary = format!(
            "Ticket {} escalated to level {}: {}",
            ticket.id, ticket.escalation_level, ticket.subject
        );

        let email = self
            .email_user(&target, &format!("Ticket escalated: {}", ticket.subject), &summary)
            .await;
        let sms = self.sms_user(&target, &summary).await;
        email.and(sms)
    }

    async fn send_bulk_notification(
        &self,
        user_ids: &[String],
        subject: &str,
        message: &str,
    ) -> Result<BulkDispatchReport> {
        if subject.trim().is_empty() && message.trim().is_empty() {
            return Err(HelpdeskError::validation(
                "message",
                "A bulk notification needs a subject or a message",
            ));
        }

        let mut seen = HashSet::new();
        let recipients: Vec<String> = user_ids
            .iter()
            .filter(|id| seen.insert(id.as_str()))
            .cloned()
            .collect();

        let outcomes: Vec<(String, Result<()>)> = stream::iter(recipients)
            .map(|user_id: String| async move {
                let outcome = self.deliver_bulk(&user_id, subject, message).await;
                (user_id, outcome)
            })
            .buffered(self.bulk_concurrency)
            .collect()
            .await;

        let mut report = BulkDispatchReport::default();
        for (user_id, outcome) in outcomes {
            report.record(user_id, outcome);
        }

        info!(
            "Bulk notification finished: {} delivered, {} failed",
            report.success_count(),
            report.failure_count()
        );
        Ok(report)
    }

    async fn send_email_notification(&self, address: &str, subject: &str, message: &str) -> Result<()> {
        if !address.validate_email() {
            return Err(HelpdeskError::validation("email", "Invalid email address"));
        }

        match self.email.send_email(address, subject, message).await {
            Ok(()) => {
                counter!("notifications_sent_total", "channel" => "email").increment(1);
                Ok(())
            }
            Err(e) => {
                counter!("notifications_failed_total", "channel" => "email").increment(1);
                Err(e)
            }
        }
    }

    async fn send_sms_notification(&self, phone_number: &str, message: &str) -> Result<()> {
        let phone = PhoneNumber::new(phone_number)?;

        match self.sms.send_sms(phone.as_str(), message).await {
            Ok(()) => {
                counter!("notifications_sent_total", "channel" => "sms").increment(1);
                Ok(())
            }
            Err(e) => {
                counter!("notifications_failed_total", "channel" => "sms").increment(1);
                Err(e)
            }
        }
    }
}

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::domain::entities::{Ticket, TicketPriority, TicketStatus, User};
use crate::domain::repositories::{TicketRepository, UserRepository};
use crate::domain::services::NotificationService;
use crate::shared::{HelpdeskError, Result};

/// Who is performing a ticket operation.
#[derive(Debug, Clone)]
pub struct Actor {
    pub user_id: String,
    pub organization_id: String,
    pub is_staff: bool,
}

#[derive(Debug, Clone)]
pub struct NewTicket {
    pub customer_id: String,
    pub subject: String,
    pub description: String,
    pub priority: TicketPriority,
    pub due_at: Option<DateTime<Utc>>,
}

/// Ticket lifecycle: persistence first, then notification.
///
/// Notification failures are logged and never undo or fail the ticket change.
pub struct TicketService {
    tickets: Arc<dyn TicketRepository>,
    users: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationService>,
}

impl TicketService {
    pub fn new(
        tickets: Arc<dyn TicketRepository>,
        users: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        Self {
            tickets,
            users,
            notifications,
        }
    }

    pub async fn open_ticket(&self, actor: &Actor, new_ticket: NewTicket) -> Result<Ticket> {
        if !actor.is_staff && new_ticket.customer_id != actor.user_id {
            return Err(HelpdeskError::Forbidden {
                reason: "Customers can only open tickets for themselves".to_string(),
            });
        }

        let customer = self
            .users
            .get_by_id(&new_ticket.customer_id)
            .await?
            .filter(|user| user.belongs_to(&actor.organization_id))
            .ok_or_else(|| HelpdeskError::not_found(format!("Customer {}", new_ticket.customer_id)))?;

        let ticket = Ticket::new(
            actor.organization_id.clone(),
            customer.id,
            new_ticket.subject,
            new_ticket.description,
            new_ticket.priority,
            new_ticket.due_at,
        );
        self.tickets.add(&ticket).await?;

        info!("Opened ticket {} for organization {}", ticket.id, ticket.organization_id);
        Ok(ticket)
    }

    /// Ticket visible to the actor: same organization, and customers only see their own.
    pub async fn get_ticket(&self, actor: &Actor, ticket_id: &str) -> Result<Ticket> {
        let ticket = self
            .tickets
            .get_by_id(ticket_id)
            .await?
            .filter(|t| t.organization_id == actor.organization_id)
            .filter(|t| actor.is_staff || t.customer_id == actor.user_id)
            .ok_or_else(|| HelpdeskError::not_found(format!("Ticket {}", ticket_id)))?;
        Ok(ticket)
    }

    pub async fn list_tickets(&self, actor: &Actor) -> Result<Vec<Ticket>> {
        let mut tickets = self
            .tickets
            .get_by_organization_id(&actor.organization_id)
            .await?;
        if !actor.is_staff {
            tickets.retain(|t| t.customer_id == actor.user_id);
        }
        Ok(tickets)
    }

    pub async fn assign(&self, actor: &Actor, ticket_id: &str, agent_id: &str) -> Result<Ticket> {
        Self::require_staff(actor)?;
        let mut ticket = self.get_ticket(actor, ticket_id).await?;
        let agent = self.staff_member(agent_id, &ticket.organization_id).await?;

        ticket.assign(agent.id.clone())?;
        self.tickets.update(&ticket).await?;
        info!("Ticket {} assigned to {}", ticket.id, agent.id);

        self.dispatch(
            "ticket assigned",
            self.notifications.notify_ticket_assigned(&ticket.id, &agent.id),
        )
        .await;
        Ok(ticket)
    }

    pub async fn change_status(
        &self,
        actor: &Actor,
        ticket_id: &str,
        status: TicketStatus,
    ) -> Result<Ticket> {
        Self::require_staff(actor)?;
        let mut ticket = self.get_ticket(actor, ticket_id).await?;

        ticket.transition_to(status)?;
        self.tickets.update(&ticket).await?;
        info!("Ticket {} moved to {:?}", ticket.id, status);

        self.dispatch(
            "ticket updated",
            self.notifications.notify_ticket_updated(&ticket.id, &actor.user_id),
        )
        .await;
        if status == TicketStatus::Resolved {
            self.dispatch(
                "ticket resolved",
                self.notifications.notify_ticket_resolved(&ticket.id),
            )
            .await;
        }
        Ok(ticket)
    }

    pub async fn record_response(&self, actor: &Actor, ticket_id: &str) -> Result<Ticket> {
        let mut ticket = self.get_ticket(actor, ticket_id).await?;

        ticket.record_response(actor.is_staff)?;
        self.tickets.update(&ticket).await?;

        self.dispatch(
            "new response",
            self.notifications.notify_new_response(&ticket.id, &actor.user_id),
        )
        .await;
        Ok(ticket)
    }

    pub async fn escalate(&self, actor: &Actor, ticket_id: &str, escalated_to: &str) -> Result<Ticket> {
        Self::require_staff(actor)?;
        let mut ticket = self.get_ticket(actor, ticket_id).await?;
        let target = self.staff_member(escalated_to, &ticket.organization_id).await?;

        ticket.escalate(target.id.clone())?;
        self.tickets.update(&ticket).await?;
        info!(
            "Ticket {} escalated to {} (level {})",
            ticket.id, target.id, ticket.escalation_level
        );

        self.dispatch(
            "ticket escalated",
            self.notifications.notify_ticket_escalated(&ticket.id, &target.id),
        )
        .await;
        Ok(ticket)
    }

    /// Report each overdue ticket once. Returns how many were reported.
    pub async fn process_overdue(&self, now: DateTime<Utc>) -> Result<usize> {
        let overdue = self.tickets.get_overdue(now).await?;
        let mut reported = 0;

        for ticket in overdue {
            match self.notifications.notify_ticket_overdue(&ticket.id).await {
                Ok(()) => {
                    // Targeted write: the ticket may have changed while we were notifying.
                    if self.tickets.mark_overdue_notified(&ticket.id, now).await? {
                        reported += 1;
                    }
                }
                Err(e) => warn!("Overdue notice for ticket {} failed: {}", ticket.id, e),
            }
        }

        if reported > 0 {
            info!("Reported {} overdue tickets", reported);
        }
        Ok(reported)
    }

    fn require_staff(actor: &Actor) -> Result<()> {
        if actor.is_staff {
            Ok(())
        } else {
            Err(HelpdeskError::Forbidden {
                reason: "Only agents and admins can manage tickets".to_string(),
            })
        }
    }

    async fn staff_member(&self, user_id: &str, organization_id: &str) -> Result<User> {
        let user = self
            .users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| HelpdeskError::not_found(format!("User {}", user_id)))?;

        if !user.belongs_to(organization_id) || !user.role.is_staff() || !user.is_active {
            return Err(HelpdeskError::business_rule(format!(
                "User {} is not an active staff member of this organization",
                user_id
            )));
        }
        Ok(user)
    }

    async fn dispatch<F>(&self, kind: &str, notification: F)
    where
        F: Future<Output = Result<()>>,
    {
        if let Err(e) = notification.await {
            warn!("Failed to send {} notification: {}", kind, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::UserRole;
    use crate::domain::services::notification_service::MockNotificationService;
    use crate::infrastructure::memory::MemoryStore;
    use chrono::Duration;

    struct Fixture {
        store: MemoryStore,
        customer: User,
        agent: User,
        staff: Actor,
    }

    async fn fixture() -> Fixture {
        let store = MemoryStore::new();
        let repos = store.repositories();

        let mut customer = User::new("ada@example.com", "Ada".to_string(), String::new(), UserRole::Customer);
        customer.organization_id = Some("org-1".to_string());
        let mut agent = User::new("bob@example.com", "Bob".to_string(), String::new(), UserRole::Agent);
        agent.organization_id = Some("org-1".to_string());
        repos.users.add(&customer).await.unwrap();
        repos.users.add(&agent).await.unwrap();

        let staff = Actor {
            user_id: agent.id.clone(),
            organization_id: "org-1".to_string(),
            is_staff: true,
        };
        Fixture {
            store,
            customer,
            agent,
            staff,
        }
    }

    fn service(store: &MemoryStore, notifications: MockNotificationService) -> TicketService {
        let repos = store.repositories();
        TicketService::new(repos.tickets, repos.users, Arc::new(notifications))
    }

    fn new_ticket(customer_id: &str) -> NewTicket {
        NewTicket {
            customer_id: customer_id.to_string(),
            subject: "VPN drops".to_string(),
            description: "Every 10 minutes".to_string(),
            priority: TicketPriority::Normal,
            due_at: None,
        }
    }

    #[tokio::test]
    async fn assignment_notifies_the_agent() {
        let f = fixture().await;
        let agent_id = f.agent.id.clone();
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_ticket_assigned()
            .withf(move |_, agent| agent == agent_id)
            .times(1)
            .returning(|_, _| Ok(()));

        let svc = service(&f.store, notifications);
        let ticket = svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();
        let assigned = svc.assign(&f.staff, &ticket.id, &f.agent.id).await.unwrap();

        assert_eq!(assigned.assignee_id.as_deref(), Some(f.agent.id.as_str()));
        assert_eq!(assigned.status, TicketStatus::InProgress);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_operation() {
        let f = fixture().await;
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_ticket_updated()
            .returning(|_, _| Err(HelpdeskError::ExternalService {
                service: "email".to_string(),
                message: "down".to_string(),
            }));
        notifications
            .expect_notify_ticket_resolved()
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(&f.store, notifications);
        let ticket = svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();
        let resolved = svc
            .change_status(&f.staff, &ticket.id, TicketStatus::Resolved)
            .await
            .unwrap();

        assert_eq!(resolved.status, TicketStatus::Resolved);
        let stored = f.store.repositories().tickets.get_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Resolved);
    }

    #[tokio::test]
    async fn customers_cannot_be_assignees() {
        let f = fixture().await;
        let svc = service(&f.store, MockNotificationService::new());
        let ticket = svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();

        let err = svc.assign(&f.staff, &ticket.id, &f.customer.id).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::BusinessRuleViolation { .. }));
    }

    #[tokio::test]
    async fn other_organizations_cannot_see_tickets() {
        let f = fixture().await;
        let svc = service(&f.store, MockNotificationService::new());
        let ticket = svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();

        let outsider = Actor {
            user_id: "someone".to_string(),
            organization_id: "org-2".to_string(),
            is_staff: true,
        };
        let err = svc.get_ticket(&outsider, &ticket.id).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::NotFound { .. }));
    }

    #[tokio::test]
    async fn customer_reply_reopens_and_notifies() {
        let f = fixture().await;
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_new_response()
            .times(2)
            .returning(|_, _| Ok(()));

        let svc = service(&f.store, notifications);
        let ticket = svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();
        let waiting = svc.record_response(&f.staff, &ticket.id).await.unwrap();
        assert_eq!(waiting.status, TicketStatus::WaitingOnCustomer);

        let customer = Actor {
            user_id: f.customer.id.clone(),
            organization_id: "org-1".to_string(),
            is_staff: false,
        };
        let reopened = svc.record_response(&customer, &ticket.id).await.unwrap();
        assert_eq!(reopened.status, TicketStatus::Open);
    }

    #[tokio::test]
    async fn overdue_tickets_are_reported_once() {
        let f = fixture().await;
        let mut notifications = MockNotificationService::new();
        notifications
            .expect_notify_ticket_overdue()
            .times(1)
            .returning(|_| Ok(()));

        let svc = service(&f.store, notifications);
        let mut late = new_ticket(&f.customer.id);
        late.due_at = Some(Utc::now() - Duration::hours(2));
        svc.open_ticket(&f.staff, late).await.unwrap();
        svc.open_ticket(&f.staff, new_ticket(&f.customer.id)).await.unwrap();

        assert_eq!(svc.process_overdue(Utc::now()).await.unwrap(), 1);
        assert_eq!(svc.process_overdue(Utc::now()).await.unwrap(), 0);
    }

    /// Resolves the ticket while its overdue notice is in flight.
    struct ResolvingNotifier {
        tickets: Arc<dyn TicketRepository>,
    }

    #[async_trait::async_trait]
    impl NotificationService for ResolvingNotifier {
        async fn notify_ticket_assigned(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_ticket_updated(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_new_response(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_ticket_resolved(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_ticket_overdue(&self, ticket_id: &str) -> Result<()> {
            let mut ticket = self.tickets.get_by_id(ticket_id).await?.unwrap();
            ticket.transition_to(TicketStatus::Resolved)?;
            self.tickets.update(&ticket).await
        }
        async fn send_welcome(&self, _: &str) -> Result<()> {
            Ok(())
        }
        async fn notify_ticket_escalated(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn send_bulk_notification(
            &self,
            _: &[String],
            _: &str,
            _: &str,
        ) -> Result<crate::domain::services::BulkDispatchReport> {
            Ok(Default::default())
        }
        async fn send_email_notification(&self, _: &str, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
        async fn send_sms_notification(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn overdue_scan_keeps_concurrent_status_changes() {
        let f = fixture().await;
        let repos = f.store.repositories();
        let svc = TicketService::new(
            repos.tickets.clone(),
            repos.users.clone(),
            Arc::new(ResolvingNotifier {
                tickets: repos.tickets.clone(),
            }),
        );

        let mut late = new_ticket(&f.customer.id);
        late.due_at = Some(Utc::now() - Duration::hours(1));
        let ticket = svc.open_ticket(&f.staff, late).await.unwrap();

        let now = Utc::now();
        assert_eq!(svc.process_overdue(now).await.unwrap(), 1);

        let stored = repos.tickets.get_by_id(&ticket.id).await.unwrap().unwrap();
        assert_eq!(stored.status, TicketStatus::Resolved);
        assert!(stored.resolved_at.is_some());
        assert_eq!(stored.overdue_notified_at, Some(now));
    }
}

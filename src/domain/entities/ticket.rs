use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;
use crate::shared::{HelpdeskError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TicketStatus {
    Open,
    InProgress,
    WaitingOnCustomer,
    Escalated,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn can_transition_to(&self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match self {
            Open => matches!(next, InProgress | WaitingOnCustomer | Escalated | Resolved | Closed),
            InProgress => matches!(next, Open | WaitingOnCustomer | Escalated | Resolved | Closed),
            WaitingOnCustomer => matches!(next, Open | InProgress | Escalated | Resolved | Closed),
            Escalated => matches!(next, InProgress | WaitingOnCustomer | Resolved | Closed),
            Resolved => matches!(next, Open | Closed),
            Closed => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TicketStatus::Resolved | TicketStatus::Closed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TicketPriority {
    Low,
    Normal,
    High,
    Urgent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub assignee_id: Option<String>,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub escalation_level: u32,
    pub due_at: Option<DateTime<Utc>>,
    pub last_response_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub overdue_notified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Ticket, "tickets", scoped);

impl Ticket {
    pub fn new(
        organization_id: String,
        customer_id: String,
        subject: String,
        description: String,
        priority: TicketPriority,
        due_at: Option<DateTime<Utc>>,
    ) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            customer_id,
            assignee_id: None,
            subject,
            description,
            status: TicketStatus::Open,
            priority,
            escalation_level: 0,
            due_at,
            last_response_at: None,
            resolved_at: None,
            overdue_notified_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn transition_to(&mut self, next: TicketStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(HelpdeskError::business_rule(format!(
                "Ticket cannot move from {:?} to {:?}",
                self.status, next
            )));
        }

        let now = crate::shared::utils::now();
        self.status = next;
        self.resolved_at = match next {
            TicketStatus::Resolved | TicketStatus::Closed => self.resolved_at.or(Some(now)),
            _ => None,
        };
        self.updated_at = now;
        Ok(())
    }

    pub fn assign(&mut self, agent_id: String) -> Result<()> {
        if self.status.is_terminal() {
            return Err(HelpdeskError::business_rule(
                "Resolved or closed tickets cannot be reassigned",
            ));
        }
        if self.assignee_id.as_deref() == Some(agent_id.as_str()) {
            return Err(HelpdeskError::business_rule(
                "Ticket is already assigned to this agent",
            ));
        }

        self.assignee_id = Some(agent_id);
        if self.status == TicketStatus::Open {
            self.status = TicketStatus::InProgress;
        }
        self.updated_at = crate::shared::utils::now();
        Ok(())
    }

    pub fn escalate(&mut self, escalated_to: String) -> Result<()> {
        if self.status.is_terminal() {
            return Err(HelpdeskError::business_rule(
                "Resolved or closed tickets cannot be escalated",
            ));
        }

        self.escalation_level += 1;
        self.priority = TicketPriority::Urgent;
        self.assignee_id = Some(escalated_to);
        self.status = TicketStatus::Escalated;
        self.updated_at = crate::shared::utils::now();
        Ok(())
    }

    /// A reply from staff waits on the customer; a customer reply reopens the ticket.
    pub fn record_response(&mut self, from_staff: bool) -> Result<()> {
        if self.status == TicketStatus::Closed {
            return Err(HelpdeskError::business_rule(
                "Closed tickets do not accept responses",
            ));
        }

        let now = crate::shared::utils::now();
        self.status = if from_staff {
            TicketStatus::WaitingOnCustomer
        } else {
            TicketStatus::Open
        };
        self.resolved_at = None;
        self.last_response_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal()
            && self.overdue_notified_at.is_none()
            && self.due_at.map(|due| due < now).unwrap_or(false)
    }

    pub fn mark_overdue_notified(&mut self, at: DateTime<Utc>) {
        self.overdue_notified_at = Some(at);
    }

    /// Involved parties that should hear about a change made by `actor_id`.
    pub fn participants_except(&self, actor_id: &str) -> Vec<String> {
        let mut participants = vec![self.customer_id.clone()];
        if let Some(assignee) = &self.assignee_id {
            if assignee != &self.customer_id {
                participants.push(assignee.clone());
            }
        }
        participants.retain(|id| id != actor_id);
        participants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ticket() -> Ticket {
        Ticket::new(
            "org-1".to_string(),
            "customer-1".to_string(),
            "Printer offline".to_string(),
            "Nothing prints".to_string(),
            TicketPriority::Normal,
            None,
        )
    }

    #[test]
    fn closed_tickets_cannot_reopen() {
        let mut t = ticket();
        t.transition_to(TicketStatus::Closed).unwrap();
        assert!(t.resolved_at.is_some());

        let err = t.transition_to(TicketStatus::Open).unwrap_err();
        assert!(matches!(err, HelpdeskError::BusinessRuleViolation { .. }));
    }

    #[test]
    fn reopening_clears_resolution() {
        let mut t = ticket();
        t.transition_to(TicketStatus::Resolved).unwrap();
        t.transition_to(TicketStatus::Open).unwrap();
        assert!(t.resolved_at.is_none());
    }

    #[test]
    fn assignment_moves_open_ticket_in_progress() {
        let mut t = ticket();
        t.assign("agent-1".to_string()).unwrap();
        assert_eq!(t.status, TicketStatus::InProgress);
        assert!(t.assign("agent-1".to_string()).is_err());
    }

    #[test]
    fn escalation_raises_priority_and_level() {
        let mut t = ticket();
        t.escalate("lead-1".to_string()).unwrap();
        t.transition_to(TicketStatus::InProgress).unwrap();
        t.escalate("manager-1".to_string()).unwrap();

        assert_eq!(t.escalation_level, 2);
        assert_eq!(t.priority, TicketPriority::Urgent);
        assert_eq!(t.assignee_id.as_deref(), Some("manager-1"));
    }

    #[test]
    fn overdue_only_once_and_only_when_open() {
        let now = crate::shared::utils::now();
        let mut t = ticket();
        t.due_at = Some(now - Duration::hours(1));
        assert!(t.is_overdue(now));

        t.mark_overdue_notified(now);
        assert!(!t.is_overdue(now));

        let mut resolved = ticket();
        resolved.due_at = Some(now - Duration::hours(1));
        resolved.transition_to(TicketStatus::Resolved).unwrap();
        assert!(!resolved.is_overdue(now));
    }

    #[test]
    fn participants_skip_the_actor() {
        let mut t = ticket();
        t.assign("agent-1".to_string()).unwrap();
        assert_eq!(t.participants_except("agent-1"), vec!["customer-1".to_string()]);
        assert_eq!(t.participants_except("customer-1"), vec!["agent-1".to_string()]);
        assert_eq!(t.participants_except("someone-else").len(), 2);
    }
}

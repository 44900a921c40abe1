use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::InMemoryRepository;
use crate::domain::entities::{Organization, Ticket, TicketStatus, User, UserRole};
use crate::domain::repositories::{OrganizationRepository, TicketRepository, UserRepository};
use crate::shared::Result;

#[async_trait]
impl OrganizationRepository for InMemoryRepository<Organization> {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>> {
        let slug = slug.trim().to_lowercase();
        Ok(self.select(|o| o.slug == slug).await.into_iter().next())
    }
}

#[async_trait]
impl UserRepository for InMemoryRepository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let email = User::normalize_email(email);
        Ok(self.select(|u| u.email == email).await.into_iter().next())
    }

    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<User>> {
        Ok(self.select(|u| u.belongs_to(organization_id)).await)
    }

    async fn get_by_role(&self, organization_id: &str, role: UserRole) -> Result<Vec<User>> {
        Ok(self
            .select(|u| u.belongs_to(organization_id) && u.role == role)
            .await)
    }
}

#[async_trait]
impl TicketRepository for InMemoryRepository<Ticket> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Ticket>> {
        Ok(self.select(|t| t.organization_id == organization_id).await)
    }

    async fn get_by_assignee(&self, assignee_id: &str) -> Result<Vec<Ticket>> {
        Ok(self
            .select(|t| t.assignee_id.as_deref() == Some(assignee_id))
            .await)
    }

    async fn get_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>> {
        Ok(self.select(|t| t.status == status).await)
    }

    async fn get_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>> {
        Ok(self.select(|t| t.is_overdue(now)).await)
    }

    async fn mark_overdue_notified(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        Ok(self
            .modify(id, |t| t.mark_overdue_notified(at))
            .await
            .is_some())
    }
}

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::mongo_repository::{
    enum_value, from_bson_time, to_bson_time, MongoEntity, MongoRepository,
};
use crate::domain::entities::{Ticket, TicketPriority, TicketStatus};
use crate::domain::repositories::TicketRepository;
use crate::shared::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub customer_id: String,
    pub assignee_id: Option<String>,
    pub subject: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub escalation_level: u32,
    pub due_at: Option<bson::DateTime>,
    pub last_response_at: Option<bson::DateTime>,
    pub resolved_at: Option<bson::DateTime>,
    pub overdue_notified_at: Option<bson::DateTime>,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Ticket {
    type Document = TicketDocument;

    fn to_document(&self) -> TicketDocument {
        TicketDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            customer_id: self.customer_id.clone(),
            assignee_id: self.assignee_id.clone(),
            subject: self.subject.clone(),
            description: self.description.clone(),
            status: self.status,
            priority: self.priority,
            escalation_level: self.escalation_level,
            due_at: self.due_at.map(to_bson_time),
            last_response_at: self.last_response_at.map(to_bson_time),
            resolved_at: self.resolved_at.map(to_bson_time),
            overdue_notified_at: self.overdue_notified_at.map(to_bson_time),
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: TicketDocument) -> Result<Self> {
        Ok(Ticket {
            id: doc.id,
            organization_id: doc.organization_id,
            customer_id: doc.customer_id,
            assignee_id: doc.assignee_id,
            subject: doc.subject,
            description: doc.description,
            status: doc.status,
            priority: doc.priority,
            escalation_level: doc.escalation_level,
            due_at: doc.due_at.map(from_bson_time),
            last_response_at: doc.last_response_at.map(from_bson_time),
            resolved_at: doc.resolved_at.map(from_bson_time),
            overdue_notified_at: doc.overdue_notified_at.map(from_bson_time),
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[async_trait]
impl TicketRepository for MongoRepository<Ticket> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Ticket>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_by_assignee(&self, assignee_id: &str) -> Result<Vec<Ticket>> {
        self.find_sorted_by_id(doc! { "assignee_id": assignee_id }).await
    }

    async fn get_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>> {
        self.find_sorted_by_id(doc! { "status": enum_value(&status)? })
            .await
    }

    async fn get_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>> {
        self.find_sorted_by_id(overdue_filter(now)?).await
    }

    async fn mark_overdue_notified(&self, id: &str, at: DateTime<Utc>) -> Result<bool> {
        self.set_fields(id, doc! { "overdue_notified_at": to_bson_time(at) })
            .await
    }
}

fn overdue_filter(now: DateTime<Utc>) -> Result<Document> {
    let terminal = vec![
        enum_value(&TicketStatus::Resolved)?,
        enum_value(&TicketStatus::Closed)?,
    ];
    Ok(doc! {
        "due_at": { "$lt": to_bson_time(now) },
        "status": { "$nin": terminal },
        "overdue_notified_at": Bson::Null,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overdue_filter_skips_closed_and_reported_tickets() {
        let now = Utc::now();
        let filter = overdue_filter(now).unwrap();

        assert_eq!(
            filter.get_document("due_at").unwrap().get_datetime("$lt").unwrap(),
            &to_bson_time(now)
        );
        let excluded = filter.get_document("status").unwrap().get_array("$nin").unwrap();
        assert_eq!(
            excluded,
            &vec![Bson::String("Resolved".into()), Bson::String("Closed".into())]
        );
        assert_eq!(filter.get("overdue_notified_at"), Some(&Bson::Null));
    }

    #[test]
    fn ticket_documents_keep_optional_dates() {
        let mut ticket = Ticket::new(
            "org-1".to_string(),
            "cust-1".to_string(),
            "Login fails".to_string(),
            "403 on every attempt".to_string(),
            TicketPriority::High,
            Some(Utc::now()),
        );
        ticket.mark_overdue_notified(Utc::now());

        let restored = Ticket::from_document(ticket.to_document()).unwrap();
        assert_eq!(restored.id, ticket.id);
        assert!(restored.due_at.is_some());
        assert!(restored.overdue_notified_at.is_some());
        assert_eq!(restored.priority, TicketPriority::High);
    }
}

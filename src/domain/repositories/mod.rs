use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::*;
use crate::shared::Result;

/// CRUD surface shared by every entity store.
///
/// Lookups of unknown ids answer `Ok(None)` / `Ok(false)`; they never error.
/// `update` of an unknown id and `add` of a duplicate are business rule violations.
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get_by_id(&self, id: &str) -> Result<Option<E>>;
    async fn get_all(&self) -> Result<Vec<E>>;
    async fn add(&self, entity: &E) -> Result<()>;
    async fn update(&self, entity: &E) -> Result<()>;
    async fn remove(&self, id: &str) -> Result<bool>;
}

#[async_trait]
pub trait OrganizationRepository: Repository<Organization> {
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Organization>>;
}

#[async_trait]
pub trait UserRepository: Repository<User> {
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<User>>;
    async fn get_by_role(&self, organization_id: &str, role: UserRole) -> Result<Vec<User>>;
}

#[async_trait]
pub trait TicketRepository: Repository<Ticket> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Ticket>>;
    async fn get_by_assignee(&self, assignee_id: &str) -> Result<Vec<Ticket>>;
    async fn get_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>>;
    /// Unresolved tickets past due that have not been reported yet.
    async fn get_overdue(&self, now: DateTime<Utc>) -> Result<Vec<Ticket>>;
    /// Sets only `overdue_notified_at`; other fields keep their stored values.
    /// `false` when the id is unknown.
    async fn mark_overdue_notified(&self, id: &str, at: DateTime<Utc>) -> Result<bool>;
}

#[async_trait]
pub trait ArticleRepository: Repository<Article> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Article>>;
    async fn get_published_by_organization(&self, organization_id: &str) -> Result<Vec<Article>>;
    async fn search_by_tags(&self, tags: &str) -> Result<Vec<Article>>;
    async fn get_most_viewed(&self, count: usize) -> Result<Vec<Article>>;
    /// Atomic `view_count += 1`; `None` when the id is unknown.
    async fn increment_view_count(&self, id: &str) -> Result<Option<Article>>;
}

#[async_trait]
pub trait CannedResponseRepository: Repository<CannedResponse> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<CannedResponse>>;
    async fn search_by_tags(&self, tags: &str) -> Result<Vec<CannedResponse>>;
    async fn get_most_used(&self, count: usize) -> Result<Vec<CannedResponse>>;
    /// Atomic `usage_count += 1`; `None` when the id is unknown.
    async fn increment_usage_count(&self, id: &str) -> Result<Option<CannedResponse>>;
}

#[async_trait]
pub trait OrderRepository: Repository<Order> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Order>>;
    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Order>>;
    async fn get_by_status(&self, status: OrderStatus) -> Result<Vec<Order>>;
    async fn get_by_date_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<Order>>;
    /// Sum of `total_cents` over every order.
    async fn get_total_revenue(&self) -> Result<i64>;
}

#[async_trait]
pub trait SubscriptionRepository: Repository<Subscription> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Subscription>>;
    async fn get_by_customer_id(&self, customer_id: &str) -> Result<Vec<Subscription>>;
    async fn get_by_status(&self, status: SubscriptionStatus) -> Result<Vec<Subscription>>;
    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>>;
    async fn get_expiring_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Subscription>>;
}

#[async_trait]
pub trait TransactionRepository: Repository<Transaction> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Transaction>>;
    async fn get_by_type(&self, transaction_type: TransactionType) -> Result<Vec<Transaction>>;
    async fn get_by_status(&self, status: TransactionStatus) -> Result<Vec<Transaction>>;
    async fn get_by_date_range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Transaction>>;
    async fn get_total_amount_by_type(&self, transaction_type: TransactionType) -> Result<i64>;
}

/// One handle per repository contract, produced by the persistence context.
#[derive(Clone)]
pub struct Repositories {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub tickets: Arc<dyn TicketRepository>,
    pub articles: Arc<dyn ArticleRepository>,
    pub canned_responses: Arc<dyn CannedResponseRepository>,
    pub orders: Arc<dyn OrderRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub transactions: Arc<dyn TransactionRepository>,
}

//! In-process persistence used for development and tests.

pub mod commerce;
pub mod knowledge_base;
pub mod repository;
pub mod support;
pub mod token_store;

use std::sync::Arc;

pub use repository::InMemoryRepository;
pub use token_store::InMemoryTokenStore;

use crate::domain::entities::*;
use crate::domain::repositories::Repositories;

/// One table per entity. Clones share the same tables.
#[derive(Clone, Default)]
pub struct MemoryStore {
    organizations: Arc<InMemoryRepository<Organization>>,
    users: Arc<InMemoryRepository<User>>,
    tickets: Arc<InMemoryRepository<Ticket>>,
    articles: Arc<InMemoryRepository<Article>>,
    canned_responses: Arc<InMemoryRepository<CannedResponse>>,
    orders: Arc<InMemoryRepository<Order>>,
    subscriptions: Arc<InMemoryRepository<Subscription>>,
    transactions: Arc<InMemoryRepository<Transaction>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn repositories(&self) -> Repositories {
        Repositories {
            organizations: self.organizations.clone(),
            users: self.users.clone(),
            tickets: self.tickets.clone(),
            articles: self.articles.clone(),
            canned_responses: self.canned_responses.clone(),
            orders: self.orders.clone(),
            subscriptions: self.subscriptions.clone(),
            transactions: self.transactions.clone(),
        }
    }
}

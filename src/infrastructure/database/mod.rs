pub mod commerce_repository;
pub mod connection;
pub mod knowledge_base_repository;
pub mod mongo_repository;
pub mod redis;
pub mod ticket_repository;
pub mod user_repository;

use std::sync::Arc;
use std::time::Duration;

pub use connection::MongoDatabase;
pub use mongo_repository::{MongoEntity, MongoRepository};
pub use self::redis::RedisConnection;

use crate::domain::entities::*;
use crate::domain::repositories::Repositories;

/// Repositories over one MongoDB database, each bounded by `timeout` per call.
pub fn mongo_repositories(database: &MongoDatabase, timeout: Duration) -> Repositories {
    Repositories {
        organizations: Arc::new(MongoRepository::<Organization>::new(database, timeout)),
        users: Arc::new(MongoRepository::<User>::new(database, timeout)),
        tickets: Arc::new(MongoRepository::<Ticket>::new(database, timeout)),
        articles: Arc::new(MongoRepository::<Article>::new(database, timeout)),
        canned_responses: Arc::new(MongoRepository::<CannedResponse>::new(database, timeout)),
        orders: Arc::new(MongoRepository::<Order>::new(database, timeout)),
        subscriptions: Arc::new(MongoRepository::<Subscription>::new(database, timeout)),
        transactions: Arc::new(MongoRepository::<Transaction>::new(database, timeout)),
    }
}

pub mod article;
pub mod canned_response;
pub mod entity;
pub mod order;
pub mod organization;
pub mod subscription;
pub mod ticket;
pub mod transaction;
pub mod user;

pub use article::Article;
pub use canned_response::CannedResponse;
pub use entity::{normalize_tags, Entity, OrganizationScoped};
pub use order::{Order, OrderStatus};
pub use organization::Organization;
pub use subscription::{BillingCycle, Subscription, SubscriptionStatus};
pub use ticket::{Ticket, TicketPriority, TicketStatus};
pub use transaction::{Transaction, TransactionStatus, TransactionType};
pub use user::{User, UserRole};

pub mod auth_service;
pub mod notification_service;
pub mod ticket_service;

pub use auth_service::{AuthService, AuthToken, RegisterUser, TokenClaims, TokenStore};
pub use notification_service::{BulkDispatchReport, DeliveryFailure, NotificationService};
pub use ticket_service::{NewTicket, TicketService};

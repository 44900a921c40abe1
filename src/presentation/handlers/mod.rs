pub mod article_handlers;
pub mod auth_handlers;
pub mod billing_handlers;
pub mod canned_response_handlers;
pub mod notification_handlers;
pub mod system_handlers;
pub mod ticket_handlers;

pub mod auth_service_impl;
pub mod database;
pub mod memory;
pub mod messaging;
pub mod overdue_monitor;
pub mod persistence;

pub use auth_service_impl::AuthServiceImpl;
pub use overdue_monitor::OverdueMonitor;
pub use persistence::Persistence;

pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
pub mod shared;

pub use config::AppConfig;
pub use shared::{AppState, HelpdeskError, Result};

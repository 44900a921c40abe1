use crate::shared::HelpdeskError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub redis: Option<RedisConfig>,
    pub auth: AuthConfig,
    pub notifications: NotificationConfig,
    pub monitor: MonitorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub environment: Environment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub backend: StorageBackend,
    pub url: Option<String>,
    pub name: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
    pub operation_timeout_seconds: u64,
}

impl DatabaseConfig {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_secs(self.operation_timeout_seconds)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_hours: i64,
    pub refresh_token_ttl_days: u64,
    pub reset_token_ttl_minutes: u64,
    pub max_attempts_per_hour: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub email: Option<EmailGatewayConfig>,
    pub sms: Option<SmsGatewayConfig>,
    pub bulk_concurrency: usize,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub from_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmsGatewayConfig {
    pub base_url: String,
    pub api_key: String,
    pub sender_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub overdue_scan_interval_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl AppConfig {
    /// Load configuration from environment variables and an optional `.env` file
    pub fn from_env() -> Result<Self, HelpdeskError> {
        dotenvy::dotenv().ok(); // Don't fail if .env doesn't exist

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HelpdeskError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let backend = match var("STORAGE_BACKEND")
            .unwrap_or_else(|| "mongo".to_string())
            .to_lowercase()
            .as_str()
        {
            "mongo" | "mongodb" => StorageBackend::Mongo,
            "memory" | "in-memory" => StorageBackend::Memory,
            other => {
                return Err(HelpdeskError::Configuration {
                    message: format!("Unknown STORAGE_BACKEND: {}", other),
                })
            }
        };

        let database_url = var("DATABASE_URL");
        if backend == StorageBackend::Mongo && database_url.is_none() {
            return Err(HelpdeskError::Configuration {
                message: "DATABASE_URL is required for the mongo backend".to_string(),
            });
        }

        let email = match var("EMAIL_GATEWAY_URL") {
            Some(base_url) => Some(EmailGatewayConfig {
                base_url,
                api_key: var("EMAIL_API_KEY").unwrap_or_default(),
                from_address: var("EMAIL_FROM")
                    .unwrap_or_else(|| "support@helpdesk.local".to_string()),
            }),
            None => None,
        };

        let sms = match var("SMS_GATEWAY_URL") {
            Some(base_url) => Some(SmsGatewayConfig {
                base_url,
                api_key: var("SMS_API_KEY").unwrap_or_default(),
                sender_id: var("SMS_SENDER_ID").unwrap_or_else(|| "Helpdesk".to_string()),
            }),
            None => None,
        };

        let config = AppConfig {
            server: ServerConfig {
                host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parse_required(var("PORT"), "PORT", 8080)?,
                environment: match var("ENVIRONMENT")
                    .unwrap_or_else(|| "development".to_string())
                    .to_lowercase()
                    .as_str()
                {
                    "production" => Environment::Production,
                    "staging" => Environment::Staging,
                    _ => Environment::Development,
                },
            },
            database: DatabaseConfig {
                backend,
                url: database_url,
                name: var("DATABASE_NAME").unwrap_or_else(|| "helpdesk".to_string()),
                max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), 100),
                min_connections: parse_or(var("DATABASE_MIN_CONNECTIONS"), 5),
                connection_timeout_seconds: parse_or(var("DATABASE_TIMEOUT"), 30),
                operation_timeout_seconds: parse_required(
                    var("DATABASE_OPERATION_TIMEOUT"),
                    "DATABASE_OPERATION_TIMEOUT",
                    10,
                )?,
            },
            redis: var("REDIS_URL").map(|url| RedisConfig { url }),
            auth: AuthConfig {
                jwt_secret: var("JWT_SECRET").ok_or_else(|| HelpdeskError::Configuration {
                    message: "JWT_SECRET is required".to_string(),
                })?,
                jwt_expiration_hours: parse_or(var("JWT_EXPIRATION_HOURS"), 24),
                refresh_token_ttl_days: parse_or(var("REFRESH_TOKEN_TTL_DAYS"), 30),
                reset_token_ttl_minutes: parse_or(var("RESET_TOKEN_TTL_MINUTES"), 30),
                max_attempts_per_hour: parse_or(var("AUTH_MAX_ATTEMPTS_PER_HOUR"), 5),
            },
            notifications: NotificationConfig {
                email,
                sms,
                bulk_concurrency: parse_or::<usize>(var("NOTIFICATION_BULK_CONCURRENCY"), 8)
                    .max(1),
                request_timeout_seconds: parse_or(var("NOTIFICATION_TIMEOUT"), 10),
            },
            monitor: MonitorConfig {
                overdue_scan_interval_seconds: parse_or(var("OVERDUE_SCAN_INTERVAL_SECONDS"), 300),
            },
        };

        Ok(config)
    }

    /// Check if we're in development mode
    pub fn is_development(&self) -> bool {
        matches!(self.server.environment, Environment::Development)
    }

    /// Check if we're in production mode
    pub fn is_production(&self) -> bool {
        matches!(self.server.environment, Environment::Production)
    }

    /// Get server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

fn parse_required<T: FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, HelpdeskError> {
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| HelpdeskError::Configuration {
            message: format!("Invalid {} value", key),
        }),
        None => Ok(default),
    }
}

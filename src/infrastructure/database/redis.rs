use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::Client;
use tracing::info;

use crate::config::RedisConfig;
use crate::domain::services::TokenStore;
use crate::shared::{HelpdeskError, Result};

/// Redis-backed [`TokenStore`]. The multiplexed connection is cheap to clone
/// and safe to share between tasks.
#[derive(Clone)]
pub struct RedisConnection {
    connection: MultiplexedConnection,
}

fn redis_error(command: &str, e: redis::RedisError) -> HelpdeskError {
    HelpdeskError::ExternalService {
        service: "Redis".to_string(),
        message: format!("Redis {} failed: {}", command, e),
    }
}

impl RedisConnection {
    pub async fn new(config: &RedisConfig) -> Result<Self> {
        info!("Connecting to Redis");

        let client = Client::open(config.url.as_str()).map_err(|e| HelpdeskError::ExternalService {
            service: "Redis".to_string(),
            message: format!("Failed to create Redis client: {}", e),
        })?;

        let connection = client
            .get_multiplexed_tokio_connection()
            .await
            .map_err(|e| HelpdeskError::ExternalService {
                service: "Redis".to_string(),
                message: format!("Failed to connect to Redis: {}", e),
            })?;

        let store = Self { connection };
        store.health_check().await?;
        info!("Successfully connected to Redis");
        Ok(store)
    }
}

#[async_trait]
impl TokenStore for RedisConnection {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(ttl_seconds.max(1))
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(|e| redis_error("SET", e))
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| redis_error("GET", e))
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let removed: i64 = redis::cmd("DEL")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("DEL", e))?;
        Ok(removed > 0)
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        redis::cmd("GETDEL")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(|e| redis_error("GETDEL", e))
    }

    /// Fixed window counter: the first hit starts the window.
    async fn increment(&self, key: &str, window_seconds: u64) -> Result<i64> {
        let mut conn = self.connection.clone();
        let count: i64 = redis::cmd("INCR")
            .arg(key)
            .query_async(&mut conn)
            .await
            .map_err(|e| redis_error("INCR", e))?;

        if count == 1 {
            redis::cmd("EXPIRE")
                .arg(key)
                .arg(window_seconds.max(1))
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(|e| redis_error("EXPIRE", e))?;
        }
        Ok(count)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| redis_error("PING", e))?;
        Ok(())
    }
}

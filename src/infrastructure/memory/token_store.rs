use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use crate::domain::services::TokenStore;
use crate::shared::Result;

/// Process-local token store used when no Redis URL is configured.
#[derive(Default)]
pub struct InMemoryTokenStore {
    entries: Mutex<HashMap<String, (String, DateTime<Utc>)>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn expiry(ttl_seconds: u64) -> DateTime<Utc> {
        Utc::now() + Duration::seconds(ttl_seconds.min(i64::MAX as u64) as i64)
    }
}

#[async_trait]
impl TokenStore for InMemoryTokenStore {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), (value.to_string(), Self::expiry(ttl_seconds)));
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().await;
        match entries.get(key) {
            Some((_, expires_at)) if *expires_at <= Utc::now() => {
                entries.remove(key);
                Ok(None)
            }
            Some((value, _)) => Ok(Some(value.clone())),
            None => Ok(None),
        }
    }

    async fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.entries.lock().await.remove(key).is_some())
    }

    async fn take(&self, key: &str) -> Result<Option<String>> {
        match self.entries.lock().await.remove(key) {
            Some((value, expires_at)) if expires_at > Utc::now() => Ok(Some(value)),
            _ => Ok(None),
        }
    }

    async fn increment(&self, key: &str, window_seconds: u64) -> Result<i64> {
        let mut entries = self.entries.lock().await;
        let now = Utc::now();

        let current = match entries.get(key) {
            Some((value, expires_at)) if *expires_at > now => value.parse::<i64>().unwrap_or(0),
            _ => 0,
        };
        let expires_at = match entries.get(key) {
            Some((_, expires_at)) if *expires_at > now => *expires_at,
            _ => Self::expiry(window_seconds),
        };

        let next = current + 1;
        entries.insert(key.to_string(), (next.to_string(), expires_at));
        Ok(next)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn values_expire() {
        let store = InMemoryTokenStore::new();
        store.put("reset:abc", "user-1", 60).await.unwrap();
        store.put("reset:old", "user-2", 0).await.unwrap();

        assert_eq!(store.get("reset:abc").await.unwrap().as_deref(), Some("user-1"));
        assert!(store.get("reset:old").await.unwrap().is_none());
        assert!(store.remove("reset:abc").await.unwrap());
        assert!(!store.remove("reset:abc").await.unwrap());
    }

    #[tokio::test]
    async fn take_hands_out_a_value_once() {
        let store = InMemoryTokenStore::new();
        store.put("refresh_token:t", "user-1", 60).await.unwrap();
        store.put("refresh_token:stale", "user-1", 0).await.unwrap();

        let (first, second) = tokio::join!(store.take("refresh_token:t"), store.take("refresh_token:t"));
        let winners = [first.unwrap(), second.unwrap()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>();
        assert_eq!(winners, vec!["user-1".to_string()]);
        assert!(store.take("refresh_token:stale").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn counters_accumulate_within_window() {
        let store = InMemoryTokenStore::new();
        assert_eq!(store.increment("attempts:a", 3600).await.unwrap(), 1);
        assert_eq!(store.increment("attempts:a", 3600).await.unwrap(), 2);
        assert_eq!(store.increment("attempts:b", 3600).await.unwrap(), 1);
    }
}

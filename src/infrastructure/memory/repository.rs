use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::entities::Entity;
use crate::domain::repositories::Repository;
use crate::shared::{HelpdeskError, Result};

/// Table of entities keyed by id. Iteration order is id ascending.
///
/// Every read-modify-write runs under the write lock, which makes it atomic
/// with respect to concurrent callers.
pub struct InMemoryRepository<E: Entity> {
    rows: RwLock<BTreeMap<String, E>>,
}

impl<E: Entity> Default for InMemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(BTreeMap::new()),
        }
    }

    pub async fn select<F>(&self, predicate: F) -> Vec<E>
    where
        F: Fn(&E) -> bool + Send,
    {
        let rows = self.rows.read().await;
        rows.values().filter(|row| predicate(row)).cloned().collect()
    }

    pub async fn fold<T, F>(&self, init: T, step: F) -> T
    where
        T: Send,
        F: Fn(T, &E) -> T + Send,
    {
        let rows = self.rows.read().await;
        rows.values().fold(init, step)
    }

    /// Apply `change` to the stored row and return the updated copy.
    pub async fn modify<F>(&self, id: &str, change: F) -> Option<E>
    where
        F: FnOnce(&mut E) + Send,
    {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id)?;
        change(row);
        row.touch();
        Some(row.clone())
    }

    fn ensure_unique(rows: &BTreeMap<String, E>, entity: &E) -> Result<()> {
        if let Some((field, value)) = entity.unique_key() {
            let taken = rows.values().any(|other| {
                other.id() != entity.id()
                    && other
                        .unique_key()
                        .map(|(_, v)| v == value)
                        .unwrap_or(false)
            });
            if taken {
                return Err(HelpdeskError::business_rule(format!(
                    "{} with {} '{}' already exists",
                    E::COLLECTION,
                    field,
                    value
                )));
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> Repository<E> for InMemoryRepository<E> {
    async fn get_by_id(&self, id: &str) -> Result<Option<E>> {
        Ok(self.rows.read().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        Ok(self.rows.read().await.values().cloned().collect())
    }

    async fn add(&self, entity: &E) -> Result<()> {
        entity.check_invariants()?;

        let mut rows = self.rows.write().await;
        if rows.contains_key(entity.id()) {
            return Err(HelpdeskError::business_rule(format!(
                "{} record {} already exists",
                E::COLLECTION,
                entity.id()
            )));
        }
        Self::ensure_unique(&rows, entity)?;

        rows.insert(entity.id().to_string(), entity.clone());
        info!("Added {} record {}", E::COLLECTION, entity.id());
        Ok(())
    }

    async fn update(&self, entity: &E) -> Result<()> {
        entity.check_invariants()?;

        let mut rows = self.rows.write().await;
        if !rows.contains_key(entity.id()) {
            return Err(HelpdeskError::business_rule(format!(
                "Cannot update missing {} record {}",
                E::COLLECTION,
                entity.id()
            )));
        }
        Self::ensure_unique(&rows, entity)?;

        rows.insert(entity.id().to_string(), entity.clone());
        Ok(())
    }

    async fn remove(&self, id: &str) -> Result<bool> {
        let removed = self.rows.write().await.remove(id).is_some();
        if removed {
            info!("Removed {} record {}", E::COLLECTION, id);
        }
        Ok(removed)
    }
}

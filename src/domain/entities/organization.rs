use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::impl_entity;

/// Tenant root. Every scoped record points back here by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub slug: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(Organization, "organizations", unique = slug);

impl Organization {
    pub fn new(name: String, slug: String) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            name,
            slug: slug.trim().to_lowercase(),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated_at = crate::shared::utils::now();
    }
}

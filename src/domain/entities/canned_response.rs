use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{impl_entity, normalize_tags};

/// Reusable reply template
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponse {
    pub id: String,
    pub organization_id: String,
    pub created_by: Option<String>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub usage_count: i64,
    pub is_shared: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl_entity!(CannedResponse, "canned_responses", scoped);

impl CannedResponse {
    pub fn new(
        organization_id: String,
        created_by: Option<String>,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            created_by,
            title,
            content,
            tags: normalize_tags(tags),
            usage_count: 0,
            is_shared: true,
            created_at: now,
            updated_at: now,
        }
    }
}

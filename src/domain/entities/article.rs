use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::{normalize_tags, Entity, OrganizationScoped};
use crate::shared::{HelpdeskError, Result};

/// Knowledge base article
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub organization_id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Article {
    const COLLECTION: &'static str = "articles";

    fn id(&self) -> &str {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    fn touch(&mut self) {
        self.updated_at = crate::shared::utils::now();
    }

    /// `published_at` is set exactly when the article is published.
    fn check_invariants(&self) -> Result<()> {
        if self.is_published != self.published_at.is_some() {
            return Err(HelpdeskError::validation(
                "published_at",
                "published_at must be set if and only if the article is published",
            ));
        }
        if self.view_count < 0 {
            return Err(HelpdeskError::validation("view_count", "view count cannot be negative"));
        }
        Ok(())
    }
}

impl OrganizationScoped for Article {
    fn organization_id(&self) -> &str {
        &self.organization_id
    }
}

impl Article {
    pub fn new(
        organization_id: String,
        author_id: Option<String>,
        title: String,
        content: String,
        tags: Vec<String>,
    ) -> Self {
        let now = crate::shared::utils::now();
        Self {
            id: crate::shared::utils::generate_id(),
            organization_id,
            author_id,
            title,
            content,
            tags: normalize_tags(tags),
            is_published: false,
            published_at: None,
            view_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn publish(&mut self) -> Result<()> {
        if self.is_published {
            return Err(HelpdeskError::business_rule("Article is already published"));
        }
        let now = crate::shared::utils::now();
        self.is_published = true;
        self.published_at = Some(now);
        self.updated_at = now;
        Ok(())
    }

    pub fn unpublish(&mut self) -> Result<()> {
        if !self.is_published {
            return Err(HelpdeskError::business_rule("Article is not published"));
        }
        self.is_published = false;
        self.published_at = None;
        self.updated_at = crate::shared::utils::now();
        Ok(())
    }

    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.tags = normalize_tags(tags);
        self.updated_at = crate::shared::utils::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article() -> Article {
        Article::new(
            "org-1".to_string(),
            None,
            "Resetting your password".to_string(),
            "Open settings...".to_string(),
            vec!["Account".to_string(), " password ".to_string()],
        )
    }

    #[test]
    fn new_articles_are_drafts_with_normalized_tags() {
        let a = article();
        assert!(!a.is_published);
        assert!(a.published_at.is_none());
        assert_eq!(a.tags, vec!["account", "password"]);
        assert!(a.check_invariants().is_ok());
    }

    #[test]
    fn publishing_keeps_timestamp_in_step() {
        let mut a = article();
        a.publish().unwrap();
        assert!(a.published_at.is_some());
        assert!(a.check_invariants().is_ok());
        assert!(a.publish().is_err());

        a.unpublish().unwrap();
        assert!(a.published_at.is_none());
        assert!(a.check_invariants().is_ok());
    }

    #[test]
    fn inconsistent_publication_state_is_rejected() {
        let mut a = article();
        a.is_published = true;
        assert!(matches!(
            a.check_invariants(),
            Err(HelpdeskError::ValidationError { .. })
        ));

        let mut b = article();
        b.published_at = Some(crate::shared::utils::now());
        assert!(b.check_invariants().is_err());
    }
}

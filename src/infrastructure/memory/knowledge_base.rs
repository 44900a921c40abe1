use async_trait::async_trait;

use super::InMemoryRepository;
use crate::domain::entities::{Article, CannedResponse};
use crate::domain::queries::{by_counter_desc, result_limit, TagQuery};
use crate::domain::repositories::{ArticleRepository, CannedResponseRepository};
use crate::shared::Result;

#[async_trait]
impl ArticleRepository for InMemoryRepository<Article> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Article>> {
        Ok(self.select(|a| a.organization_id == organization_id).await)
    }

    async fn get_published_by_organization(&self, organization_id: &str) -> Result<Vec<Article>> {
        Ok(self
            .select(|a| a.organization_id == organization_id && a.is_published)
            .await)
    }

    async fn search_by_tags(&self, tags: &str) -> Result<Vec<Article>> {
        let query = TagQuery::parse(tags);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.select(|a| query.matches(&a.tags)).await)
    }

    async fn get_most_viewed(&self, count: usize) -> Result<Vec<Article>> {
        let limit = result_limit(count)?;
        let mut articles = self.select(|_| true).await;
        articles.sort_by(|a, b| {
            by_counter_desc((a.view_count, a.id.as_str()), (b.view_count, b.id.as_str()))
        });
        articles.truncate(limit);
        Ok(articles)
    }

    async fn increment_view_count(&self, id: &str) -> Result<Option<Article>> {
        Ok(self.modify(id, |a| a.view_count += 1).await)
    }
}

#[async_trait]
impl CannedResponseRepository for InMemoryRepository<CannedResponse> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<CannedResponse>> {
        Ok(self.select(|c| c.organization_id == organization_id).await)
    }

    async fn search_by_tags(&self, tags: &str) -> Result<Vec<CannedResponse>> {
        let query = TagQuery::parse(tags);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self.select(|c| query.matches(&c.tags)).await)
    }

    async fn get_most_used(&self, count: usize) -> Result<Vec<CannedResponse>> {
        let limit = result_limit(count)?;
        let mut responses = self.select(|_| true).await;
        responses.sort_by(|a, b| {
            by_counter_desc((a.usage_count, a.id.as_str()), (b.usage_count, b.id.as_str()))
        });
        responses.truncate(limit);
        Ok(responses)
    }

    async fn increment_usage_count(&self, id: &str) -> Result<Option<CannedResponse>> {
        Ok(self.modify(id, |c| c.usage_count += 1).await)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::entities::Entity;
    use crate::domain::repositories::Repository;
    use crate::shared::HelpdeskError;

    fn article(org: &str, tags: &[&str]) -> Article {
        Article::new(
            org.to_string(),
            None,
            "How to".to_string(),
            "Steps".to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn organization_filter_is_exact() {
        let repo = InMemoryRepository::<Article>::new();
        let mine = [article("org-a", &[]), article("org-a", &[])];
        for a in &mine {
            repo.add(a).await.unwrap();
        }
        repo.add(&article("org-b", &[])).await.unwrap();
        repo.add(&article("org-aa", &[])).await.unwrap();

        let found = ArticleRepository::get_by_organization_id(&repo, "org-a").await.unwrap();
        let mut found_ids: Vec<_> = found.iter().map(|a| a.id.clone()).collect();
        let mut expected: Vec<_> = mine.iter().map(|a| a.id.clone()).collect();
        found_ids.sort();
        expected.sort();
        assert_eq!(found_ids, expected);

        let none = ArticleRepository::get_by_organization_id(&repo, "org-z").await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn sequential_increments_accumulate() {
        let repo = InMemoryRepository::<Article>::new();
        let a = article("org-o", &[]);
        repo.add(&a).await.unwrap();

        for _ in 0..5 {
            repo.increment_view_count(&a.id).await.unwrap();
        }

        let stored = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 5);
        let listed = ArticleRepository::get_by_organization_id(&repo, "org-o").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_are_not_lost() {
        let repo = Arc::new(InMemoryRepository::<Article>::new());
        let a = article("org-a", &[]);
        repo.add(&a).await.unwrap();

        let handles: Vec<_> = (0..200)
            .map(|_| {
                let repo = repo.clone();
                let id = a.id.clone();
                tokio::spawn(async move { repo.increment_view_count(&id).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let stored = repo.get_by_id(&a.id).await.unwrap().unwrap();
        assert_eq!(stored.view_count, 200);
    }

    #[tokio::test]
    async fn incrementing_unknown_id_returns_none() {
        let repo = InMemoryRepository::<Article>::new();
        assert!(repo.increment_view_count("missing").await.unwrap().is_none());
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
        assert!(!repo.remove("missing").await.unwrap());
    }

    #[tokio::test]
    async fn most_viewed_is_bounded_and_ordered() {
        let repo = InMemoryRepository::<Article>::new();
        for views in [3, 9, 3, 1] {
            let mut a = article("org-a", &[]);
            a.view_count = views;
            repo.add(&a).await.unwrap();
        }

        let top = repo.get_most_viewed(3).await.unwrap();
        assert_eq!(top.len(), 3);
        assert_eq!(top[0].view_count, 9);
        assert_eq!(top[1].view_count, 3);
        assert_eq!(top[2].view_count, 3);
        assert!(top[1].id < top[2].id);

        let err = repo.get_most_viewed(0).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::ValidationError { .. }));
    }

    #[tokio::test]
    async fn tag_search_matches_any_term() {
        let repo = InMemoryRepository::<Article>::new();
        let billing = article("org-a", &["Billing", "invoices"]);
        let login = article("org-a", &["login"]);
        let other = article("org-a", &["hardware"]);
        for a in [&billing, &login, &other] {
            repo.add(a).await.unwrap();
        }

        let found = ArticleRepository::search_by_tags(&repo, "BILL, log").await.unwrap();
        let ids: Vec<_> = found.iter().map(|a| a.id()).collect();
        assert_eq!(found.len(), 2);
        assert!(ids.contains(&billing.id()));
        assert!(ids.contains(&login.id()));

        assert!(ArticleRepository::search_by_tags(&repo, " , ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn inconsistent_publication_state_is_not_written() {
        let repo = InMemoryRepository::<Article>::new();
        let mut a = article("org-a", &[]);
        a.is_published = true;

        let err = repo.add(&a).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::ValidationError { .. }));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn updating_a_missing_article_is_a_business_rule_violation() {
        let repo = InMemoryRepository::<Article>::new();
        let err = repo.update(&article("org-a", &[])).await.unwrap_err();
        assert!(matches!(err, HelpdeskError::BusinessRuleViolation { .. }));
    }

    #[tokio::test]
    async fn canned_response_usage_is_counted() {
        let repo = InMemoryRepository::<CannedResponse>::new();
        let reply = CannedResponse::new(
            "org-a".to_string(),
            None,
            "Thanks".to_string(),
            "Thanks for reaching out".to_string(),
            vec!["greeting".to_string()],
        );
        repo.add(&reply).await.unwrap();

        repo.increment_usage_count(&reply.id).await.unwrap();
        let used = repo.increment_usage_count(&reply.id).await.unwrap().unwrap();
        assert_eq!(used.usage_count, 2);

        let top = repo.get_most_used(10).await.unwrap();
        assert_eq!(top.len(), 1);
        let found = CannedResponseRepository::search_by_tags(&repo, "greet").await.unwrap();
        assert_eq!(found.len(), 1);
    }
}

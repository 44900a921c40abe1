use async_trait::async_trait;
use bson::doc;
use serde::{Deserialize, Serialize};

use super::mongo_repository::{
    counter_sort, from_bson_time, tag_filter, to_bson_time, MongoEntity, MongoRepository,
};
use crate::domain::entities::{Article, CannedResponse};
use crate::domain::queries::{result_limit, TagQuery};
use crate::domain::repositories::{ArticleRepository, CannedResponseRepository};
use crate::shared::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub author_id: Option<String>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub is_published: bool,
    pub published_at: Option<bson::DateTime>,
    pub view_count: i64,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for Article {
    type Document = ArticleDocument;

    fn to_document(&self) -> ArticleDocument {
        ArticleDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            author_id: self.author_id.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            is_published: self.is_published,
            published_at: self.published_at.map(to_bson_time),
            view_count: self.view_count,
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: ArticleDocument) -> Result<Self> {
        Ok(Article {
            id: doc.id,
            organization_id: doc.organization_id,
            author_id: doc.author_id,
            title: doc.title,
            content: doc.content,
            tags: doc.tags,
            is_published: doc.is_published,
            published_at: doc.published_at.map(from_bson_time),
            view_count: doc.view_count,
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CannedResponseDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub organization_id: String,
    pub created_by: Option<String>,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    pub usage_count: i64,
    pub is_shared: bool,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
}

impl MongoEntity for CannedResponse {
    type Document = CannedResponseDocument;

    fn to_document(&self) -> CannedResponseDocument {
        CannedResponseDocument {
            id: self.id.clone(),
            organization_id: self.organization_id.clone(),
            created_by: self.created_by.clone(),
            title: self.title.clone(),
            content: self.content.clone(),
            tags: self.tags.clone(),
            usage_count: self.usage_count,
            is_shared: self.is_shared,
            created_at: to_bson_time(self.created_at),
            updated_at: to_bson_time(self.updated_at),
        }
    }

    fn from_document(doc: CannedResponseDocument) -> Result<Self> {
        Ok(CannedResponse {
            id: doc.id,
            organization_id: doc.organization_id,
            created_by: doc.created_by,
            title: doc.title,
            content: doc.content,
            tags: doc.tags,
            usage_count: doc.usage_count,
            is_shared: doc.is_shared,
            created_at: from_bson_time(doc.created_at),
            updated_at: from_bson_time(doc.updated_at),
        })
    }
}

#[async_trait]
impl ArticleRepository for MongoRepository<Article> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<Article>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn get_published_by_organization(&self, organization_id: &str) -> Result<Vec<Article>> {
        self.find_sorted_by_id(doc! {
            "organization_id": organization_id,
            "is_published": true,
        })
        .await
    }

    async fn search_by_tags(&self, tags: &str) -> Result<Vec<Article>> {
        let query = TagQuery::parse(tags);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.find_sorted_by_id(tag_filter("tags", &query)).await
    }

    async fn get_most_viewed(&self, count: usize) -> Result<Vec<Article>> {
        let limit = result_limit(count)? as i64;
        self.find_many(
            doc! {},
            counter_sort("view_count"),
            Some(limit),
        )
        .await
    }

    async fn increment_view_count(&self, id: &str) -> Result<Option<Article>> {
        self.increment(id, "view_count").await
    }
}

#[async_trait]
impl CannedResponseRepository for MongoRepository<CannedResponse> {
    async fn get_by_organization_id(&self, organization_id: &str) -> Result<Vec<CannedResponse>> {
        self.find_sorted_by_id(doc! { "organization_id": organization_id })
            .await
    }

    async fn search_by_tags(&self, tags: &str) -> Result<Vec<CannedResponse>> {
        let query = TagQuery::parse(tags);
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.find_sorted_by_id(tag_filter("tags", &query)).await
    }

    async fn get_most_used(&self, count: usize) -> Result<Vec<CannedResponse>> {
        let limit = result_limit(count)? as i64;
        self.find_many(
            doc! {},
            counter_sort("usage_count"),
            Some(limit),
        )
        .await
    }

    async fn increment_usage_count(&self, id: &str) -> Result<Option<CannedResponse>> {
        self.increment(id, "usage_count").await
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use metrics::counter;
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::domain::entities::Article;
use crate::domain::queries::{by_counter_desc, result_limit};
use crate::presentation::middleware::AuthenticatedUser;
use crate::shared::{AppState, HelpdeskError, Result};

#[derive(Debug, Deserialize)]
pub struct ListArticlesQuery {
    #[serde(default)]
    pub published: bool,
}

#[derive(Debug, Deserialize)]
pub struct TagSearchQuery {
    #[serde(default)]
    pub tags: String,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateArticleRequest {
    #[validate(length(min = 1, max = 200, message = "عنوان باید بین ۱ تا ۲۰۰ کاراکتر باشد"))]
    pub title: String,
    #[validate(length(min = 1, message = "متن مقاله الزامی است"))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub publish: bool,
}

/// Article of the caller's organization, or 404.
async fn scoped_article(app_state: &AppState, user: &AuthenticatedUser, id: &str) -> Result<Article> {
    let organization_id = user.organization_id()?;
    app_state
        .repositories
        .articles
        .get_by_id(id)
        .await?
        .filter(|article| article.organization_id == organization_id)
        .filter(|article| article.is_published || user.claims().is_staff())
        .ok_or_else(|| HelpdeskError::not_found(format!("Article {}", id)))
}

pub async fn list_articles(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<ListArticlesQuery>,
) -> Result<Json<Vec<Article>>> {
    let organization_id = user.organization_id()?;
    let articles = if query.published || !user.claims().is_staff() {
        app_state
            .repositories
            .articles
            .get_published_by_organization(organization_id)
            .await?
    } else {
        app_state
            .repositories
            .articles
            .get_by_organization_id(organization_id)
            .await?
    };
    Ok(Json(articles))
}

pub async fn search_articles(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<Vec<Article>>> {
    let organization_id = user.organization_id()?;
    let is_staff = user.claims().is_staff();

    let mut articles = app_state.repositories.articles.search_by_tags(&query.tags).await?;
    articles.retain(|a| a.organization_id == organization_id && (a.is_published || is_staff));
    Ok(Json(articles))
}

/// Top articles of the caller's organization by view count.
pub async fn most_viewed_articles(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<CountQuery>,
) -> Result<Json<Vec<Article>>> {
    let limit = result_limit(query.count.unwrap_or(10))?;
    let mut articles = app_state
        .repositories
        .articles
        .get_published_by_organization(user.organization_id()?)
        .await?;

    articles.sort_by(|a, b| {
        by_counter_desc((a.view_count, a.id.as_str()), (b.view_count, b.id.as_str()))
    });
    articles.truncate(limit);
    Ok(Json(articles))
}

/// Reading an article counts as a view.
pub async fn get_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Article>> {
    scoped_article(&app_state, &user, &id).await?;

    let article = app_state
        .repositories
        .articles
        .increment_view_count(&id)
        .await?
        .ok_or_else(|| HelpdeskError::not_found(format!("Article {}", id)))?;
    counter!("article_views_total").increment(1);

    Ok(Json(article))
}

pub async fn create_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    JsonExtractor(request): JsonExtractor<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>)> {
    user.require_staff()?;
    request.validate()?;

    let mut article = Article::new(
        user.organization_id()?.to_string(),
        Some(user.user_id().to_string()),
        request.title,
        request.content,
        request.tags,
    );
    if request.publish {
        article.publish()?;
    }

    app_state.repositories.articles.add(&article).await?;
    info!("Article {} created by {}", article.id, user.user_id());
    Ok((StatusCode::CREATED, Json(article)))
}

pub async fn publish_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Article>> {
    user.require_staff()?;
    let mut article = scoped_article(&app_state, &user, &id).await?;

    article.publish()?;
    app_state.repositories.articles.update(&article).await?;
    Ok(Json(article))
}

pub async fn unpublish_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Article>> {
    user.require_staff()?;
    let mut article = scoped_article(&app_state, &user, &id).await?;

    article.unpublish()?;
    app_state.repositories.articles.update(&article).await?;
    Ok(Json(article))
}

pub async fn delete_article(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    user.require_staff()?;
    scoped_article(&app_state, &user, &id).await?;

    app_state.repositories.articles.remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

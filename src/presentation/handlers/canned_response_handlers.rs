use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::article_handlers::TagSearchQuery;
use crate::domain::entities::CannedResponse;
use crate::presentation::middleware::AuthenticatedUser;
use crate::shared::{AppState, HelpdeskError, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCannedResponseRequest {
    #[validate(length(min = 1, max = 200, message = "عنوان باید بین ۱ تا ۲۰۰ کاراکتر باشد"))]
    pub title: String,
    #[validate(length(min = 1, message = "متن پاسخ الزامی است"))]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

pub async fn list_canned_responses(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<CannedResponse>>> {
    user.require_staff()?;
    let responses = app_state
        .repositories
        .canned_responses
        .get_by_organization_id(user.organization_id()?)
        .await?;
    Ok(Json(responses))
}

pub async fn search_canned_responses(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<TagSearchQuery>,
) -> Result<Json<Vec<CannedResponse>>> {
    user.require_staff()?;
    let organization_id = user.organization_id()?;

    let mut responses = app_state
        .repositories
        .canned_responses
        .search_by_tags(&query.tags)
        .await?;
    responses.retain(|r| r.organization_id == organization_id);
    Ok(Json(responses))
}

pub async fn create_canned_response(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    JsonExtractor(request): JsonExtractor<CreateCannedResponseRequest>,
) -> Result<(StatusCode, Json<CannedResponse>)> {
    user.require_staff()?;
    request.validate()?;

    let response = CannedResponse::new(
        user.organization_id()?.to_string(),
        Some(user.user_id().to_string()),
        request.title,
        request.content,
        request.tags,
    );
    app_state.repositories.canned_responses.add(&response).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// Count one use of a canned response and return it.
pub async fn use_canned_response(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<CannedResponse>> {
    user.require_staff()?;
    let organization_id = user.organization_id()?;
    let not_found = || HelpdeskError::not_found(format!("Canned response {}", id));

    app_state
        .repositories
        .canned_responses
        .get_by_id(&id)
        .await?
        .filter(|r| r.organization_id == organization_id)
        .ok_or_else(not_found)?;

    let response = app_state
        .repositories
        .canned_responses
        .increment_usage_count(&id)
        .await?
        .ok_or_else(not_found)?;
    Ok(Json(response))
}

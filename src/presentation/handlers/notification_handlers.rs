use axum::{extract::State, response::Json, Json as JsonExtractor};
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;
use validator::Validate;

use crate::domain::services::BulkDispatchReport;
use crate::presentation::middleware::AuthenticatedUser;
use crate::shared::{AppState, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct BulkNotificationRequest {
    #[validate(length(min = 1, message = "حداقل یک گیرنده لازم است"))]
    pub user_ids: Vec<String>,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub message: String,
}

/// Send one message to many users. Partial delivery is reported, not failed.
pub async fn send_bulk_notification(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    JsonExtractor(request): JsonExtractor<BulkNotificationRequest>,
) -> Result<Json<BulkDispatchReport>> {
    user.require_admin()?;
    request.validate()?;

    info!(
        "Bulk notification requested by {} for {} recipients",
        user.user_id(),
        request.user_ids.len()
    );
    let report = app_state
        .notification_service
        .send_bulk_notification(&request.user_ids, &request.subject, &request.message)
        .await?;
    Ok(Json(report))
}

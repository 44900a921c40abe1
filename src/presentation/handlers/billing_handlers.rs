use axum::{
    extract::{Query, State},
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::domain::entities::{Order, Subscription, SubscriptionStatus, TransactionType};
use crate::presentation::middleware::AuthenticatedUser;
use crate::shared::{AppState, HelpdeskError, Result};

#[derive(Debug, Deserialize)]
pub struct OrderQuery {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionQuery {
    pub status: Option<SubscriptionStatus>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionTotalQuery {
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

#[derive(Debug, Serialize)]
pub struct AmountResponse {
    pub total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct TransactionTotalResponse {
    pub transaction_type: TransactionType,
    pub total_cents: i64,
}

/// Orders of the caller's organization, optionally within `[start, end]`.
pub async fn list_orders(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<OrderQuery>,
) -> Result<Json<Vec<Order>>> {
    user.require_staff()?;
    let organization_id = user.organization_id()?;
    let orders = &app_state.repositories.orders;

    let orders = match (query.start, query.end) {
        (Some(start), Some(end)) => {
            let mut orders = orders.get_by_date_range(start, end).await?;
            orders.retain(|o| o.organization_id == organization_id);
            orders
        }
        (None, None) => orders.get_by_organization_id(organization_id).await?,
        _ => {
            return Err(HelpdeskError::validation(
                "date_range",
                "start and end must be given together",
            ))
        }
    };
    Ok(Json(orders))
}

/// Platform-wide revenue. Admin only.
pub async fn total_revenue(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<AmountResponse>> {
    user.require_admin()?;
    let total_cents = app_state.repositories.orders.get_total_revenue().await?;
    Ok(Json(AmountResponse { total_cents }))
}

pub async fn list_subscriptions(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<SubscriptionQuery>,
) -> Result<Json<Vec<Subscription>>> {
    user.require_staff()?;
    let organization_id = user.organization_id()?;
    let subscriptions = &app_state.repositories.subscriptions;

    let subscriptions = match query.status {
        Some(status) => {
            let mut found = subscriptions.get_by_status(status).await?;
            found.retain(|s| s.organization_id == organization_id);
            found
        }
        None => subscriptions.get_by_organization_id(organization_id).await?,
    };
    Ok(Json(subscriptions))
}

/// Platform-wide total for one transaction type. Admin only.
pub async fn transaction_total(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Query(query): Query<TransactionTotalQuery>,
) -> Result<Json<TransactionTotalResponse>> {
    user.require_admin()?;
    let total_cents = app_state
        .repositories
        .transactions
        .get_total_amount_by_type(query.transaction_type)
        .await?;
    Ok(Json(TransactionTotalResponse {
        transaction_type: query.transaction_type,
        total_cents,
    }))
}

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    Json as JsonExtractor,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use crate::domain::entities::{Ticket, TicketPriority, TicketStatus};
use crate::domain::services::NewTicket;
use crate::presentation::middleware::AuthenticatedUser;
use crate::shared::{AppState, Result};

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTicketRequest {
    /// Defaults to the caller.
    pub customer_id: Option<String>,
    #[validate(length(min = 1, max = 200, message = "موضوع باید بین ۱ تا ۲۰۰ کاراکتر باشد"))]
    pub subject: String,
    #[validate(length(min = 1, message = "شرح درخواست الزامی است"))]
    pub description: String,
    #[serde(default = "default_priority")]
    pub priority: TicketPriority,
    pub due_at: Option<DateTime<Utc>>,
}

fn default_priority() -> TicketPriority {
    TicketPriority::Normal
}

#[derive(Debug, Deserialize)]
pub struct AssignTicketRequest {
    pub agent_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangeStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize)]
pub struct EscalateTicketRequest {
    pub escalated_to: String,
}

pub async fn create_ticket(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    JsonExtractor(request): JsonExtractor<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>)> {
    request.validate()?;
    let actor = user.actor()?;

    let ticket = app_state
        .ticket_service
        .open_ticket(
            &actor,
            NewTicket {
                customer_id: request.customer_id.unwrap_or_else(|| actor.user_id.clone()),
                subject: request.subject,
                description: request.description,
                priority: request.priority,
                due_at: request.due_at,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

pub async fn list_tickets(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Ticket>>> {
    let tickets = app_state.ticket_service.list_tickets(&user.actor()?).await?;
    Ok(Json(tickets))
}

pub async fn get_ticket(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>> {
    let ticket = app_state.ticket_service.get_ticket(&user.actor()?, &id).await?;
    Ok(Json(ticket))
}

pub async fn assign_ticket(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    JsonExtractor(request): JsonExtractor<AssignTicketRequest>,
) -> Result<Json<Ticket>> {
    let ticket = app_state
        .ticket_service
        .assign(&user.actor()?, &id, &request.agent_id)
        .await?;
    Ok(Json(ticket))
}

pub async fn change_ticket_status(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    JsonExtractor(request): JsonExtractor<ChangeStatusRequest>,
) -> Result<Json<Ticket>> {
    let ticket = app_state
        .ticket_service
        .change_status(&user.actor()?, &id, request.status)
        .await?;
    Ok(Json(ticket))
}

pub async fn record_ticket_response(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
) -> Result<Json<Ticket>> {
    let ticket = app_state
        .ticket_service
        .record_response(&user.actor()?, &id)
        .await?;
    Ok(Json(ticket))
}

pub async fn escalate_ticket(
    State(app_state): State<Arc<AppState>>,
    user: AuthenticatedUser,
    Path(id): Path<String>,
    JsonExtractor(request): JsonExtractor<EscalateTicketRequest>,
) -> Result<Json<Ticket>> {
    let ticket = app_state
        .ticket_service
        .escalate(&user.actor()?, &id, &request.escalated_to)
        .await?;
    Ok(Json(ticket))
}

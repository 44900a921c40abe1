use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::shared::AppState;

/// Health check endpoint - always returns healthy if the service is running
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "helpdesk-backend",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Readiness check endpoint - checks if the service is ready to accept traffic
pub async fn readiness_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let db_status = match state.persistence.health_check().await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    let token_store_status = match state.token_store.health_check().await {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    let ready = db_status == "ok" && token_store_status == "ok";
    let body = Json(json!({
        "status": if ready { "ready" } else { "not_ready" },
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "service": "helpdesk-backend",
        "version": env!("CARGO_PKG_VERSION"),
        "checks": {
            "database": db_status,
            "backend": state.persistence.backend_name(),
            "token_store": token_store_status
        }
    }));

    if ready {
        (StatusCode::OK, body)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, body)
    }
}

/// Prometheus text exposition
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.metrics {
        Some(handle) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            handle.render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// Root handler - basic API information
pub async fn root_handler() -> Json<Value> {
    Json(json!({
        "service": "Helpdesk Backend API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Tickets, knowledge base and customer notifications",
        "endpoints": {
            "health": "/health",
            "ready": "/ready",
            "metrics": "/metrics",
            "api_v1": "/api/v1"
        }
    }))
}

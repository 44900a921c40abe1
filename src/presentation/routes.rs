use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::presentation::handlers::{
    article_handlers, auth_handlers, billing_handlers, canned_response_handlers,
    notification_handlers, system_handlers, ticket_handlers,
};
use crate::presentation::middleware::auth_middleware;
use crate::shared::AppState;

/// Full HTTP surface of the service.
pub fn router(app_state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/login", post(auth_handlers::login))
        .route("/register", post(auth_handlers::register))
        .route("/forgot-password", post(auth_handlers::forgot_password))
        .route("/reset-password", post(auth_handlers::reset_password))
        .route("/refresh", post(auth_handlers::refresh_token))
        .route("/logout", post(auth_handlers::logout));

    // Protected API routes (require authentication)
    let protected_routes = Router::new()
        .route(
            "/tickets",
            get(ticket_handlers::list_tickets).post(ticket_handlers::create_ticket),
        )
        .route("/tickets/:id", get(ticket_handlers::get_ticket))
        .route("/tickets/:id/assign", post(ticket_handlers::assign_ticket))
        .route("/tickets/:id/status", post(ticket_handlers::change_ticket_status))
        .route(
            "/tickets/:id/responses",
            post(ticket_handlers::record_ticket_response),
        )
        .route("/tickets/:id/escalate", post(ticket_handlers::escalate_ticket))
        .route(
            "/articles",
            get(article_handlers::list_articles).post(article_handlers::create_article),
        )
        .route("/articles/search", get(article_handlers::search_articles))
        .route(
            "/articles/most-viewed",
            get(article_handlers::most_viewed_articles),
        )
        .route(
            "/articles/:id",
            get(article_handlers::get_article).delete(article_handlers::delete_article),
        )
        .route("/articles/:id/publish", post(article_handlers::publish_article))
        .route(
            "/articles/:id/unpublish",
            post(article_handlers::unpublish_article),
        )
        .route(
            "/canned-responses",
            get(canned_response_handlers::list_canned_responses)
                .post(canned_response_handlers::create_canned_response),
        )
        .route(
            "/canned-responses/search",
            get(canned_response_handlers::search_canned_responses),
        )
        .route(
            "/canned-responses/:id/use",
            post(canned_response_handlers::use_canned_response),
        )
        .route("/orders", get(billing_handlers::list_orders))
        .route("/orders/revenue", get(billing_handlers::total_revenue))
        .route("/subscriptions", get(billing_handlers::list_subscriptions))
        .route(
            "/transactions/total",
            get(billing_handlers::transaction_total),
        )
        .route(
            "/notifications/bulk",
            post(notification_handlers::send_bulk_notification),
        )
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth_middleware,
        ));

    // API v1 routes
    let api_v1 = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    Router::new()
        .route("/health", get(system_handlers::health_check))
        .route("/ready", get(system_handlers::readiness_check))
        .route("/metrics", get(system_handlers::metrics))
        .route("/", get(system_handlers::root_handler))
        .nest("/api/v1", api_v1)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

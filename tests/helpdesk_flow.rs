use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use helpdesk_backend::domain::entities::{Organization, User, UserRole};
use helpdesk_backend::infrastructure::memory::InMemoryTokenStore;
use helpdesk_backend::infrastructure::messaging::LoggingGateway;
use helpdesk_backend::infrastructure::Persistence;
use helpdesk_backend::presentation::router;
use helpdesk_backend::shared::utils::hash_password;
use helpdesk_backend::{AppConfig, AppState};

const PASSWORD: &str = "correct-horse";

struct TestApp {
    router: Router,
    state: Arc<AppState>,
    organization_id: String,
}

impl TestApp {
    async fn new() -> Self {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STORAGE_BACKEND", "memory"),
            ("JWT_SECRET", "integration-secret"),
            ("AUTH_MAX_ATTEMPTS_PER_HOUR", "50"),
        ]);
        let config = AppConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();

        let state = Arc::new(AppState::assemble(
            config,
            Persistence::memory(),
            Arc::new(InMemoryTokenStore::new()),
            Arc::new(LoggingGateway),
            Arc::new(LoggingGateway),
            None,
        ));

        let organization = Organization::new("Acme".to_string(), "acme".to_string());
        state.repositories.organizations.add(&organization).await.unwrap();

        Self {
            router: router(state.clone()),
            state,
            organization_id: organization.id,
        }
    }

    async fn seed_user(&self, email: &str, role: UserRole) -> User {
        let mut user = User::new(
            email,
            email.to_string(),
            hash_password(PASSWORD).unwrap(),
            role,
        );
        user.organization_id = Some(self.organization_id.clone());
        self.state.repositories.users.add(&user).await.unwrap();
        user
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => request.body(Body::empty()),
        }
        .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .send(
                Method::POST,
                "/api/v1/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["access_token"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn customer_opens_ticket_and_agent_resolves_it() {
    let app = TestApp::new().await;
    let agent = app.seed_user("agent@acme.test", UserRole::Agent).await;

    let (status, registered) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "Customer@Acme.test",
                "full_name": "Cora Customer",
                "password": "s3cret-pw",
                "confirm_password": "s3cret-pw",
                "organization_id": app.organization_id,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(registered["email"], "customer@acme.test");
    assert_eq!(registered["role"], "Customer");

    let customer_token = app.login("customer@acme.test", "s3cret-pw").await;
    let (status, ticket) = app
        .send(
            Method::POST,
            "/api/v1/tickets",
            Some(&customer_token),
            Some(json!({ "subject": "Printer on fire", "description": "Smoke everywhere" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(ticket["status"], "Open");
    assert_eq!(ticket["customer_id"], registered["id"]);
    let ticket_id = ticket["id"].as_str().unwrap().to_string();

    let (status, tickets) = app
        .send(Method::GET, "/api/v1/tickets", Some(&customer_token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(tickets.as_array().unwrap().len(), 1);

    let assign_uri = format!("/api/v1/tickets/{}/assign", ticket_id);
    let (status, _) = app
        .send(
            Method::POST,
            &assign_uri,
            Some(&customer_token),
            Some(json!({ "agent_id": agent.id })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let agent_token = app.login("agent@acme.test", PASSWORD).await;
    let (status, assigned) = app
        .send(
            Method::POST,
            &assign_uri,
            Some(&agent_token),
            Some(json!({ "agent_id": agent.id })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(assigned["assignee_id"], agent.id.as_str());
    assert_eq!(assigned["status"], "InProgress");

    let (status, resolved) = app
        .send(
            Method::POST,
            &format!("/api/v1/tickets/{}/status", ticket_id),
            Some(&agent_token),
            Some(json!({ "status": "Resolved" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["status"], "Resolved");

    let (status, _) = app
        .send(
            Method::POST,
            &format!("/api/v1/tickets/{}/assign", ticket_id),
            Some(&agent_token),
            Some(json!({ "agent_id": agent.id })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn protected_routes_require_a_bearer_token() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/api/v1/tickets", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"]["code"], "AUTHENTICATION_FAILED");

    let (status, _) = app
        .send(Method::GET, "/api/v1/tickets", Some("not-a-jwt"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_errors_are_reported_per_field() {
    let app = TestApp::new().await;

    let (status, body) = app
        .send(
            Method::POST,
            "/api/v1/auth/register",
            None,
            Some(json!({
                "email": "broken",
                "full_name": "Bad Input",
                "password": "s3cret-pw",
                "confirm_password": "other-pw",
                "phone": "12ab",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let fields = &body["error"]["fields"];
    assert!(fields.get("email").is_some());
    assert!(fields.get("confirm_password").is_some());
    assert!(fields.get("phone").is_some());
}

#[tokio::test]
async fn published_articles_are_searchable_and_count_views() {
    let app = TestApp::new().await;
    app.seed_user("agent@acme.test", UserRole::Agent).await;
    app.seed_user("reader@acme.test", UserRole::Customer).await;
    let agent_token = app.login("agent@acme.test", PASSWORD).await;
    let reader_token = app.login("reader@acme.test", PASSWORD).await;

    let (status, article) = app
        .send(
            Method::POST,
            "/api/v1/articles",
            Some(&agent_token),
            Some(json!({
                "title": "Resetting your router",
                "content": "Unplug it, count to ten.",
                "tags": ["Networking", "router"],
                "publish": true,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let article_id = article["id"].as_str().unwrap().to_string();

    let (status, draft) = app
        .send(
            Method::POST,
            "/api/v1/articles",
            Some(&agent_token),
            Some(json!({ "title": "Draft", "content": "Not yet", "tags": ["router"] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, found) = app
        .send(
            Method::GET,
            "/api/v1/articles/search?tags=NETWORK",
            Some(&reader_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 1);

    // Customers never see drafts
    let (status, _) = app
        .send(
            Method::GET,
            &format!("/api/v1/articles/{}", draft["id"].as_str().unwrap()),
            Some(&reader_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for expected in 1..=2 {
        let (status, viewed) = app
            .send(
                Method::GET,
                &format!("/api/v1/articles/{}", article_id),
                Some(&reader_token),
                None,
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(viewed["view_count"], expected);
    }

    let (status, top) = app
        .send(
            Method::GET,
            "/api/v1/articles/most-viewed?count=5",
            Some(&reader_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(top[0]["id"], article_id.as_str());

    let (status, body) = app
        .send(
            Method::GET,
            "/api/v1/articles/most-viewed?count=0",
            Some(&reader_token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]["fields"].get("count").is_some());
}

#[tokio::test]
async fn bulk_notifications_report_each_recipient() {
    let app = TestApp::new().await;
    app.seed_user("admin@acme.test", UserRole::Admin).await;
    let customer = app.seed_user("cust@acme.test", UserRole::Customer).await;
    let admin_token = app.login("admin@acme.test", PASSWORD).await;

    let (status, report) = app
        .send(
            Method::POST,
            "/api/v1/notifications/bulk",
            Some(&admin_token),
            Some(json!({
                "user_ids": [customer.id, "ghost", customer.id],
                "subject": "Maintenance",
                "message": "We will be down at midnight",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["delivered"], json!([customer.id]));
    assert_eq!(report["failed"][0]["user_id"], "ghost");

    let customer_token = app.login("cust@acme.test", PASSWORD).await;
    let (status, _) = app
        .send(
            Method::POST,
            "/api/v1/notifications/bulk",
            Some(&customer_token),
            Some(json!({ "user_ids": ["x"], "subject": "s", "message": "m" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn readiness_reports_the_memory_backend() {
    let app = TestApp::new().await;

    let (status, body) = app.send(Method::GET, "/ready", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
    assert_eq!(body["checks"]["backend"], "memory");

    let (status, _) = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);

    // No recorder installed in tests
    let (status, _) = app.send(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

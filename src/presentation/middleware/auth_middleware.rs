use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::warn;

use crate::domain::services::ticket_service::Actor;
use crate::domain::services::TokenClaims;
use crate::shared::{AppState, HelpdeskError, Result};

/// JWT authentication middleware
pub async fn auth_middleware(
    State(app_state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = extract_token(&request)?;

    let claims = app_state
        .auth_service
        .validate_token(&token)
        .await
        .map_err(|e| {
            warn!("Token validation failed: {}", e);
            e
        })?;

    // Add claims to request extensions for handlers to use
    request.extensions_mut().insert(claims);

    Ok(next.run(request).await)
}

/// Extract Bearer token from Authorization header
fn extract_token(request: &Request) -> Result<String> {
    let missing = || HelpdeskError::AuthenticationFailed {
        reason: "Missing bearer token".to_string(),
    };

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .ok_or_else(missing)?
        .to_str()
        .map_err(|_| missing())?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(missing)?;

    Ok(token.to_string())
}

/// Claims of the caller, placed in the request by [`auth_middleware`].
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub TokenClaims);

impl AuthenticatedUser {
    pub fn claims(&self) -> &TokenClaims {
        &self.0
    }

    pub fn user_id(&self) -> &str {
        &self.0.sub
    }

    pub fn organization_id(&self) -> Result<&str> {
        self.0
            .organization_id
            .as_deref()
            .ok_or_else(|| HelpdeskError::Forbidden {
                reason: "Account is not attached to an organization".to_string(),
            })
    }

    pub fn actor(&self) -> Result<Actor> {
        Ok(Actor {
            user_id: self.0.sub.clone(),
            organization_id: self.organization_id()?.to_string(),
            is_staff: self.0.is_staff(),
        })
    }

    pub fn require_staff(&self) -> Result<()> {
        if self.0.is_staff() {
            Ok(())
        } else {
            Err(HelpdeskError::Forbidden {
                reason: "Staff access required".to_string(),
            })
        }
    }

    pub fn require_admin(&self) -> Result<()> {
        if self.0.is_admin() {
            Ok(())
        } else {
            Err(HelpdeskError::Forbidden {
                reason: "Admin access required".to_string(),
            })
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = HelpdeskError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self> {
        parts
            .extensions
            .get::<TokenClaims>()
            .cloned()
            .map(AuthenticatedUser)
            .ok_or_else(|| HelpdeskError::AuthenticationFailed {
                reason: "Request is not authenticated".to_string(),
            })
    }
}

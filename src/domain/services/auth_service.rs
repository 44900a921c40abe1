use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{User, UserRole};
use crate::shared::Result;

/// Authentication service for credentials, sessions and password recovery
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn register(&self, registration: RegisterUser) -> Result<User>;
    async fn login(&self, email: &str, password: &str) -> Result<AuthToken>;
    /// Unknown emails succeed silently so callers cannot discover which accounts exist.
    async fn forgot_password(&self, email: &str) -> Result<()>;
    async fn reset_password(&self, email: &str, token: &str, new_password: &str) -> Result<()>;
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthToken>;
    async fn revoke_token(&self, refresh_token: &str) -> Result<()>;
    async fn validate_token(&self, token: &str) -> Result<TokenClaims>;
}

/// Short-lived secrets: refresh tokens, password reset tokens, attempt counters.
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn put(&self, key: &str, value: &str, ttl_seconds: u64) -> Result<()>;
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn remove(&self, key: &str) -> Result<bool>;
    /// Read and delete in one step. Of several concurrent callers at most one gets the value.
    async fn take(&self, key: &str) -> Result<Option<String>>;
    /// Increment a counter that expires `window_seconds` after its first hit.
    async fn increment(&self, key: &str, window_seconds: u64) -> Result<i64>;
    async fn health_check(&self) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub phone: Option<String>,
    pub organization_id: Option<String>,
    pub role: UserRole,
}

/// JWT token response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user_id: String,
}

/// JWT token claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    pub email: String,
    pub organization_id: Option<String>,
    pub role: UserRole,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

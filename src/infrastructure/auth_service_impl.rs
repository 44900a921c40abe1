use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AuthConfig;
use crate::domain::entities::User;
use crate::domain::repositories::UserRepository;
use crate::domain::services::{
    AuthService, AuthToken, NotificationService, RegisterUser, TokenClaims, TokenStore,
};
use crate::shared::types::PhoneNumber;
use crate::shared::utils::{generate_secret_token, hash_password, verify_password};
use crate::shared::{HelpdeskError, Result};

const ATTEMPT_WINDOW_SECONDS: u64 = 3600;
const MIN_PASSWORD_LENGTH: usize = 6;
const RESET_TOKEN_LENGTH: usize = 32;

pub struct AuthServiceImpl {
    config: AuthConfig,
    tokens: Arc<dyn TokenStore>,
    user_repo: Arc<dyn UserRepository>,
    notifications: Arc<dyn NotificationService>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl AuthServiceImpl {
    pub fn new(
        config: AuthConfig,
        tokens: Arc<dyn TokenStore>,
        user_repo: Arc<dyn UserRepository>,
        notifications: Arc<dyn NotificationService>,
    ) -> Self {
        let encoding_key = EncodingKey::from_secret(config.jwt_secret.as_ref());
        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_ref());

        Self {
            config,
            tokens,
            user_repo,
            notifications,
            encoding_key,
            decoding_key,
        }
    }

    fn refresh_key(token: &str) -> String {
        format!("refresh_token:{}", token)
    }

    fn reset_key(token: &str) -> String {
        format!("password_reset:{}", token)
    }

    fn invalid_credentials() -> HelpdeskError {
        HelpdeskError::AuthenticationFailed {
            reason: "Invalid email or password".to_string(),
        }
    }

    fn invalid_reset_token() -> HelpdeskError {
        HelpdeskError::AuthenticationFailed {
            reason: "Invalid or expired reset token".to_string(),
        }
    }

    fn check_password_strength(password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(HelpdeskError::validation(
                "password",
                format!("Password must be at least {} characters", MIN_PASSWORD_LENGTH),
            ));
        }
        Ok(())
    }

    /// Fixed-window attempt counter per scope and email.
    async fn check_rate_limit(&self, scope: &str, email: &str) -> Result<()> {
        let key = format!("rate_limit:{}:{}", scope, email);
        let attempts = self.tokens.increment(&key, ATTEMPT_WINDOW_SECONDS).await?;

        if attempts > self.config.max_attempts_per_hour {
            warn!("Rate limit hit for {} ({} attempts)", scope, attempts);
            return Err(HelpdeskError::RateLimitExceeded {
                resource: scope.to_string(),
            });
        }
        Ok(())
    }

    async fn generate_tokens(&self, user: &User) -> Result<AuthToken> {
        let now = Utc::now();
        let exp = now + Duration::hours(self.config.jwt_expiration_hours);

        let claims = TokenClaims {
            sub: user.id.clone(),
            email: user.email.clone(),
            organization_id: user.organization_id.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: exp.timestamp(),
        };

        let access_token =
            encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
                HelpdeskError::Internal {
                    message: format!("Failed to generate access token: {}", e),
                }
            })?;

        let refresh_token = crate::shared::utils::generate_id();
        self.tokens
            .put(
                &Self::refresh_key(&refresh_token),
                &user.id,
                self.config.refresh_token_ttl_days * 24 * 3600,
            )
            .await?;

        Ok(AuthToken {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.config.jwt_expiration_hours * 3600,
            user_id: user.id.clone(),
        })
    }
}

#[async_trait]
impl AuthService for AuthServiceImpl {
    async fn register(&self, registration: RegisterUser) -> Result<User> {
        let email = User::normalize_email(&registration.email);
        Self::check_password_strength(&registration.password)?;

        if self.user_repo.get_by_email(&email).await?.is_some() {
            return Err(HelpdeskError::business_rule(format!(
                "An account for {} already exists",
                email
            )));
        }

        let phone = registration
            .phone
            .as_deref()
            .filter(|p| !p.trim().is_empty())
            .map(PhoneNumber::new)
            .transpose()?;

        let mut user = User::new(
            &email,
            registration.full_name.trim().to_string(),
            hash_password(&registration.password)?,
            registration.role,
        );
        user.phone = phone;
        user.organization_id = registration.organization_id;

        self.user_repo.add(&user).await?;
        info!("Registered user {}", user.id);

        if let Err(e) = self.notifications.send_welcome(&user.id).await {
            warn!("Welcome notification for {} failed: {}", user.id, e);
        }

        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthToken> {
        let email = User::normalize_email(email);
        self.check_rate_limit("login", &email).await?;

        let mut user = self
            .user_repo
            .get_by_email(&email)
            .await?
            .ok_or_else(Self::invalid_credentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(Self::invalid_credentials());
        }
        if !user.is_active {
            return Err(HelpdeskError::AuthenticationFailed {
                reason: "Account is disabled".to_string(),
            });
        }

        self.tokens
            .remove(&format!("rate_limit:login:{}", email))
            .await?;
        user.record_login();
        self.user_repo.update(&user).await?;

        let tokens = self.generate_tokens(&user).await?;
        info!("Successfully authenticated user: {}", user.id);
        Ok(tokens)
    }

    async fn forgot_password(&self, email: &str) -> Result<()> {
        let email = User::normalize_email(email);
        self.check_rate_limit("password_reset", &email).await?;

        let user = match self.user_repo.get_by_email(&email).await? {
            Some(user) if user.is_active => user,
            _ => {
                info!("Password reset requested for unknown or inactive account");
                return Ok(());
            }
        };

        let token = generate_secret_token(RESET_TOKEN_LENGTH);
        self.tokens
            .put(
                &Self::reset_key(&token),
                &user.id,
                self.config.reset_token_ttl_minutes * 60,
            )
            .await?;

        self.notifications
            .send_email_notification(
                &user.email,
                "Password reset",
                &format!(
                    "Use this code to reset your password within {} minutes: {}",
                    self.config.reset_token_ttl_minutes, token
                ),
            )
            .await?;

        info!("Password reset token issued for user {}", user.id);
        Ok(())
    }

    async fn reset_password(&self, email: &str, token: &str, new_password: &str) -> Result<()> {
        Self::check_password_strength(new_password)?;

        let mut user = self
            .user_repo
            .get_by_email(email)
            .await?
            .ok_or_else(Self::invalid_reset_token)?;

        // Consumed before use so a token can only be redeemed once.
        match self.tokens.take(&Self::reset_key(token)).await? {
            Some(owner) if owner == user.id => {}
            _ => return Err(Self::invalid_reset_token()),
        }

        user.change_password(hash_password(new_password)?);
        self.user_repo.update(&user).await?;

        info!("Password reset for user {}", user.id);
        Ok(())
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthToken> {
        // Refresh tokens are single use.
        let user_id = self
            .tokens
            .take(&Self::refresh_key(refresh_token))
            .await?
            .ok_or_else(|| HelpdeskError::AuthenticationFailed {
                reason: "Invalid refresh token".to_string(),
            })?;

        let user = match self.user_repo.get_by_id(&user_id).await? {
            Some(user) if user.is_active => user,
            _ => {
                return Err(HelpdeskError::AuthenticationFailed {
                    reason: "User not found".to_string(),
                })
            }
        };

        self.generate_tokens(&user).await
    }

    async fn revoke_token(&self, refresh_token: &str) -> Result<()> {
        self.tokens.remove(&Self::refresh_key(refresh_token)).await?;
        Ok(())
    }

    async fn validate_token(&self, token: &str) -> Result<TokenClaims> {
        let validation = Validation::new(Algorithm::HS256);

        let token_data =
            decode::<TokenClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                HelpdeskError::AuthenticationFailed {
                    reason: format!("Invalid token: {}", e),
                }
            })?;

        Ok(token_data.claims)
    }
}

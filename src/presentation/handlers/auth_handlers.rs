use axum::{extract::State, http::StatusCode, response::Json, Json as JsonExtractor};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use validator::{Validate, ValidationError};

use crate::domain::entities::{User, UserRole};
use crate::domain::services::{AuthToken, RegisterUser};
use crate::shared::types::PhoneNumber;
use crate::shared::{AppState, HelpdeskError, Result};

fn validate_phone(phone: &str) -> std::result::Result<(), ValidationError> {
    PhoneNumber::new(phone)
        .map(|_| ())
        .map_err(|_| ValidationError::new("phone"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(
        required(message = "ایمیل الزامی است"),
        email(message = "فرمت ایمیل نامعتبر است")
    )]
    pub email: Option<String>,
    #[validate(required(message = "رمز عبور الزامی است"))]
    pub password: Option<String>,
    #[serde(default)]
    pub remember_me: bool,
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(
        required(message = "ایمیل الزامی است"),
        email(message = "فرمت ایمیل نامعتبر است")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "نام کامل الزامی است"),
        length(min = 1, max = 100, message = "نام کامل باید بین ۱ تا ۱۰۰ کاراکتر باشد")
    )]
    pub full_name: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, max = 100, message = "رمز عبور باید بین ۶ تا ۱۰۰ کاراکتر باشد"))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "رمز عبور و تکرار آن یکسان نیستند"))]
    pub confirm_password: String,
    #[validate(custom(function = "validate_phone", message = "شماره تلفن نامعتبر است"))]
    pub phone: Option<String>,
    pub organization_id: Option<String>,
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(
        required(message = "ایمیل الزامی است"),
        email(message = "فرمت ایمیل نامعتبر است")
    )]
    pub email: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(
        required(message = "ایمیل الزامی است"),
        email(message = "فرمت ایمیل نامعتبر است")
    )]
    pub email: Option<String>,
    #[validate(
        required(message = "کد بازیابی الزامی است"),
        length(min = 1, message = "کد بازیابی الزامی است")
    )]
    pub token: Option<String>,
    #[serde(default)]
    #[validate(length(min = 6, max = 100, message = "رمز عبور باید بین ۶ تا ۱۰۰ کاراکتر باشد"))]
    pub password: String,
    #[serde(default)]
    #[validate(must_match(other = "password", message = "رمز عبور و تکرار آن یکسان نیستند"))]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    pub user: UserInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: String,
    pub email: String,
    pub full_name: String,
    pub role: UserRole,
    pub organization_id: Option<String>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            full_name: user.full_name.clone(),
            role: user.role,
            organization_id: user.organization_id.clone(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

async fn auth_response(
    app_state: &AppState,
    token: AuthToken,
    return_url: Option<String>,
) -> Result<AuthResponse> {
    let user = app_state
        .repositories
        .users
        .get_by_id(&token.user_id)
        .await?
        .ok_or_else(|| HelpdeskError::not_found(format!("User {}", token.user_id)))?;

    Ok(AuthResponse {
        access_token: token.access_token,
        refresh_token: token.refresh_token,
        token_type: token.token_type,
        expires_in: token.expires_in,
        user: UserInfo::from(&user),
        return_url,
    })
}

/// Authenticate with email and password
pub async fn login(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    request.validate()?;
    info!(remember_me = request.remember_me, "Login request");

    let token = app_state
        .auth_service
        .login(
            request.email.as_deref().unwrap_or_default(),
            request.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(auth_response(&app_state, token, request.return_url).await?))
}

/// Create a customer account
pub async fn register(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<RegisterRequest>,
) -> Result<(StatusCode, Json<UserInfo>)> {
    request.validate()?;
    info!("Registration request");

    let user = app_state
        .auth_service
        .register(RegisterUser {
            email: request.email.unwrap_or_default(),
            full_name: request.full_name.unwrap_or_default(),
            password: request.password,
            phone: request.phone,
            organization_id: request.organization_id,
            role: UserRole::Customer,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserInfo::from(&user))))
}

/// Start password recovery. Always answers the same way.
pub async fn forgot_password(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    app_state
        .auth_service
        .forgot_password(request.email.as_deref().unwrap_or_default())
        .await?;

    Ok(Json(MessageResponse {
        message: "If the account exists, a reset code has been sent".to_string(),
    }))
}

pub async fn reset_password(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    app_state
        .auth_service
        .reset_password(
            request.email.as_deref().unwrap_or_default(),
            request.token.as_deref().unwrap_or_default(),
            &request.password,
        )
        .await?;

    Ok(Json(MessageResponse {
        message: "Password has been reset".to_string(),
    }))
}

/// Refresh access token
pub async fn refresh_token(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>> {
    info!("Token refresh request");

    let token = app_state
        .auth_service
        .refresh_token(&request.refresh_token)
        .await?;

    Ok(Json(auth_response(&app_state, token, None).await?))
}

/// Logout user (revoke tokens)
pub async fn logout(
    State(app_state): State<Arc<AppState>>,
    JsonExtractor(request): JsonExtractor<RefreshTokenRequest>,
) -> Result<StatusCode> {
    info!("Logout request");

    app_state
        .auth_service
        .revoke_token(&request.refresh_token)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

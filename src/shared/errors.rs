use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main application error type
#[derive(Debug, Error)]
pub enum HelpdeskError {
    #[error("Business rule violated: {message}")]
    BusinessRuleViolation {
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    #[error("Invalid request")]
    InvalidRequest {
        fields: BTreeMap<String, Vec<String>>,
    },

    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Access denied: {reason}")]
    Forbidden { reason: String },

    #[error("Resource not found: {resource}")]
    NotFound { resource: String },

    #[error("Rate limit exceeded: {resource}")]
    RateLimitExceeded { resource: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("External service error: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("Operation timed out: {operation}")]
    Timeout { operation: String },

    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },
}

impl HelpdeskError {
    pub fn business_rule(message: impl Into<String>) -> Self {
        HelpdeskError::BusinessRuleViolation {
            message: message.into(),
            source: None,
        }
    }

    pub fn business_rule_with_cause(
        message: impl Into<String>,
        cause: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        HelpdeskError::BusinessRuleViolation {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        HelpdeskError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        HelpdeskError::NotFound {
            resource: resource.into(),
        }
    }

    /// Infrastructure failures the caller may retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            HelpdeskError::Database { .. }
                | HelpdeskError::ExternalService { .. }
                | HelpdeskError::Timeout { .. }
        )
    }

    /// Get HTTP status code for the error
    pub fn status_code(&self) -> StatusCode {
        match self {
            HelpdeskError::BusinessRuleViolation { .. } => StatusCode::CONFLICT,
            HelpdeskError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            HelpdeskError::InvalidRequest { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            HelpdeskError::AuthenticationFailed { .. } => StatusCode::UNAUTHORIZED,
            HelpdeskError::Forbidden { .. } => StatusCode::FORBIDDEN,
            HelpdeskError::NotFound { .. } => StatusCode::NOT_FOUND,
            HelpdeskError::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            HelpdeskError::Database { .. } => StatusCode::SERVICE_UNAVAILABLE,
            HelpdeskError::ExternalService { .. } => StatusCode::BAD_GATEWAY,
            HelpdeskError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            HelpdeskError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            HelpdeskError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get error code for client identification
    pub fn error_code(&self) -> &'static str {
        match self {
            HelpdeskError::BusinessRuleViolation { .. } => "BUSINESS_RULE_VIOLATION",
            HelpdeskError::ValidationError { .. } => "VALIDATION_ERROR",
            HelpdeskError::InvalidRequest { .. } => "INVALID_REQUEST",
            HelpdeskError::AuthenticationFailed { .. } => "AUTHENTICATION_FAILED",
            HelpdeskError::Forbidden { .. } => "FORBIDDEN",
            HelpdeskError::NotFound { .. } => "NOT_FOUND",
            HelpdeskError::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            HelpdeskError::Database { .. } => "DATABASE_ERROR",
            HelpdeskError::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            HelpdeskError::Timeout { .. } => "TIMEOUT",
            HelpdeskError::Internal { .. } => "INTERNAL_ERROR",
            HelpdeskError::Configuration { .. } => "CONFIGURATION_ERROR",
        }
    }

    /// Message shown to API clients. Infrastructure details stay in the logs.
    pub fn public_message(&self) -> String {
        if self.is_retryable() {
            "Service temporarily unavailable, please retry".to_string()
        } else {
            match self {
                HelpdeskError::BusinessRuleViolation { message, .. } => message.clone(),
                HelpdeskError::Internal { .. } | HelpdeskError::Configuration { .. } => {
                    "Internal server error".to_string()
                }
                other => other.to_string(),
            }
        }
    }
}

/// Convert error to HTTP response
impl IntoResponse for HelpdeskError {
    fn into_response(self) -> Response {
        let status_code = self.status_code();

        if status_code.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }

        let mut error = json!({
            "code": self.error_code(),
            "message": self.public_message(),
            "retryable": self.is_retryable(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        });

        match &self {
            HelpdeskError::InvalidRequest { fields } => {
                error["fields"] = json!(fields);
            }
            HelpdeskError::ValidationError { field, message } => {
                let fields = BTreeMap::from([(field.clone(), vec![message.clone()])]);
                error["fields"] = json!(fields);
            }
            _ => {}
        }

        (status_code, Json(json!({ "error": error }))).into_response()
    }
}

/// Application result type
pub type Result<T> = std::result::Result<T, HelpdeskError>;

/// Convert from common error types
impl From<mongodb::error::Error> for HelpdeskError {
    fn from(err: mongodb::error::Error) -> Self {
        HelpdeskError::Database {
            message: err.to_string(),
        }
    }
}

impl From<bson::ser::Error> for HelpdeskError {
    fn from(err: bson::ser::Error) -> Self {
        HelpdeskError::Internal {
            message: format!("BSON serialization failed: {}", err),
        }
    }
}

impl From<redis::RedisError> for HelpdeskError {
    fn from(err: redis::RedisError) -> Self {
        HelpdeskError::ExternalService {
            service: "Redis".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for HelpdeskError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return HelpdeskError::Timeout {
                operation: "HTTP request".to_string(),
            };
        }
        HelpdeskError::ExternalService {
            service: "HTTP".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for HelpdeskError {
    fn from(err: serde_json::Error) -> Self {
        HelpdeskError::ValidationError {
            field: "json".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for HelpdeskError {
    fn from(err: validator::ValidationErrors) -> Self {
        let fields = err
            .field_errors()
            .iter()
            .map(|(field, errors)| {
                let messages = errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                (field.to_string(), messages)
            })
            .collect();

        HelpdeskError::InvalidRequest { fields }
    }
}

//! Consistent error responses.
//!
//! Every error body is `{ "message": string, "errors"?: [{field, message}] }`.
//! Denials from the authorization engine carry their HTTP status in the
//! reason, so no handler re-derives it.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use trackle_auth::Deny;
use trackle_core::DomainError;
use trackle_store::StoreError;

/// One field-level validation failure.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// API-boundary error taxonomy.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{0}")]
    Authentication(String),

    #[error("{0}")]
    Authorization(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("internal error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn fields(errors: Vec<FieldError>) -> Self {
        Self::Validation {
            message: "Validation error".to_string(),
            errors,
        }
    }

    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication(message.into())
    }

    pub fn forbidden() -> Self {
        Self::Authorization("Forbidden".to_string())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<Deny> for ApiError {
    fn from(deny: Deny) -> Self {
        match deny {
            Deny::NotMember | Deny::InsufficientRole => ApiError::forbidden(),
            Deny::NotFoundInScope => ApiError::not_found("Not found"),
            Deny::InvalidAssignee => ApiError::validation(deny.to_string()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ApiError::Conflict(message),
            StoreError::NotFound => ApiError::not_found("Not found"),
            StoreError::Backend(message) => {
                tracing::error!(error = %message, "storage failure");
                ApiError::Internal
            }
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(message) | DomainError::InvalidId(message) => {
                ApiError::validation(message)
            }
            DomainError::Conflict(message) => ApiError::Conflict(message),
            DomainError::NotFound => ApiError::not_found("Not found"),
            DomainError::InvariantViolation(message) => {
                tracing::error!(error = %message, "domain invariant violated");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let body = match &self {
            ApiError::Validation { message, errors } if !errors.is_empty() => {
                json!({ "message": message, "errors": errors })
            }
            ApiError::Internal => json!({ "message": "internal error" }),
            other => json!({ "message": other.to_string() }),
        };
        (status, axum::Json(body)).into_response()
    }
}

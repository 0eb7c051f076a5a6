//! Registration and login (the only unauthenticated endpoints besides
//! /health).

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    routing::post,
    Json, Router,
};

use trackle_auth::{hash_password, verify_password};
use trackle_domain::User;

use crate::app::dto::{LoginBody, LoginRequest, RegisterRequest, RegisteredUserBody};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
}

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisteredUserBody>), ApiError> {
    body.validate()?;

    let password_hash = hash_password(&body.password).map_err(|err| {
        tracing::error!(error = %err, "password hashing failed");
        ApiError::Internal
    })?;

    let user = User::new(&body.email, password_hash)?;
    let user = services
        .storage
        .users
        .create_user(user)
        .await
        .map_err(|err| match ApiError::from(err) {
            ApiError::Conflict(_) => ApiError::Conflict("Email already used".to_string()),
            other => other,
        })?;

    Ok((StatusCode::CREATED, Json(user.into())))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginBody>, ApiError> {
    body.validate()?;

    // Unknown email and wrong password are indistinguishable on the wire.
    let user = services
        .storage
        .users
        .find_user_by_email(&body.email)
        .await?
        .ok_or_else(|| ApiError::authentication("Invalid credentials"))?;

    if !verify_password(&body.password, &user.password_hash) {
        return Err(ApiError::authentication("Invalid credentials"));
    }

    let access_token = services.issue_token(&user)?;

    Ok(Json(LoginBody {
        access_token,
        user: user.into(),
    }))
}

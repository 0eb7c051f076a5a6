use std::sync::Arc;

use axum::{extract::State, http::HeaderMap, middleware::Next, response::Response};
use chrono::Utc;

use trackle_auth::TokenAuthority;

use crate::app::errors::ApiError;
use crate::context::CurrentUser;

#[derive(Clone)]
pub struct AuthState {
    pub tokens: Arc<dyn TokenAuthority>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .tokens
        .verify(token, Utc::now())
        .map_err(|_| ApiError::authentication("Invalid or expired token"))?;

    req.extensions_mut()
        .insert(CurrentUser::new(claims.sub, claims.email));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| ApiError::authentication("Missing token"))?;

    let header = header
        .to_str()
        .map_err(|_| ApiError::authentication("Missing token"))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::authentication("Missing token"))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::authentication("Missing token"));
    }

    Ok(token)
}

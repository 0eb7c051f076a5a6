use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::context::CurrentUser;

/// GET /health - liveness probe, no auth.
pub async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

/// GET /me - echo the authenticated identity.
pub async fn me(Extension(user): Extension<CurrentUser>) -> Json<Value> {
    Json(json!({
        "user": {
            "id": user.user_id(),
            "email": user.email(),
        }
    }))
}

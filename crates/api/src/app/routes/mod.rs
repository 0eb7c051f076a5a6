use axum::{routing::get, Router};

pub mod auth;
pub mod comments;
pub mod members;
pub mod projects;
pub mod system;
pub mod tickets;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/me", get(system::me))
        .nest("/projects", projects::router())
        .nest("/members", members::router())
}

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    routing::get,
    Json, Router,
};
use uuid::Uuid;

use trackle_core::ProjectId;

use crate::app::dto::MemberListItemBody;
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new().route("/:project_id", get(list_members))
}

/// GET /members/:project_id - members only.
pub async fn list_members(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<MemberListItemBody>>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;

    let project = services
        .storage
        .projects
        .find(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let items = services
        .storage
        .memberships
        .list_by_project(project_id)
        .await?
        .into_iter()
        .map(|(_membership, member)| MemberListItemBody {
            user: member.into(),
            project: project.clone().into(),
        })
        .collect();

    Ok(Json(items))
}

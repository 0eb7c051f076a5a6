use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use uuid::Uuid;

use trackle_auth::Role;
use trackle_core::ProjectId;
use trackle_domain::Project;

use crate::app::dto::{
    CreateProjectRequest, ProjectBody, ProjectDetailBody, ProjectListItemBody,
};
use crate::app::errors::ApiError;
use crate::app::routes::tickets;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_project).get(list_projects))
        .route("/:project_id", get(get_project).delete(delete_project))
        .nest("/:project_id/tickets", tickets::router())
}

/// POST /projects - create a project; the creator becomes its OWNER in the
/// same atomic unit.
pub async fn create_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ProjectBody>), ApiError> {
    let project = Project::new(&body.name, user.user_id())?;
    let (project, membership) = services.storage.projects.create_with_owner(project).await?;

    Ok((
        StatusCode::CREATED,
        Json(ProjectBody {
            project: project.into(),
            my_role: membership.role,
        }),
    ))
}

/// GET /projects - the caller's projects, newest membership first.
pub async fn list_projects(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Vec<ProjectListItemBody>>, ApiError> {
    let rows = services
        .storage
        .memberships
        .list_by_user(user.user_id())
        .await?;

    let items = rows
        .into_iter()
        .map(|(membership, project)| ProjectListItemBody {
            project: project.into(),
            my_role: membership.role,
            joined_at: membership.joined_at,
        })
        .collect();

    Ok(Json(items))
}

/// GET /projects/:id - project details with its member list. Members only.
pub async fn get_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<ProjectDetailBody>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let membership = services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;

    let project = services
        .storage
        .projects
        .find(project_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Project not found"))?;

    let members = services
        .storage
        .memberships
        .list_by_project(project_id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ProjectDetailBody {
        project: project.into(),
        members,
        my_role: membership.role,
    }))
}

/// DELETE /projects/:id - OWNER only; cascades to tickets, comments and
/// memberships.
pub async fn delete_project(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    services
        .guard
        .require_role(project_id, user.user_id(), &[Role::Owner])
        .await?;

    services.storage.projects.delete_cascading(project_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

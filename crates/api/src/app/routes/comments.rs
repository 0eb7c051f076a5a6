//! Comment routes, nested under .../tickets/:ticket_id/comments.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use trackle_auth::{can_act_on_comment, CommentAction, CommentRef};
use trackle_core::{CommentId, ProjectId, TicketId};
use trackle_domain::Comment;

use crate::app::dto::{CommentBody, CreateCommentRequest};
use crate::app::errors::ApiError;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

/// POST .../comments - any member; the author is the authenticated caller.
pub async fn create_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<CommentBody>), ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);

    services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;

    let comment = Comment::new(ticket.id, user.user_id(), &body.content)?;
    let comment = services.storage.comments.insert(comment).await?;

    let author = services
        .storage
        .users
        .find_user_by_id(user.user_id())
        .await?
        .ok_or(ApiError::Internal)?;

    Ok((StatusCode::CREATED, Json((comment, author).into())))
}

/// GET .../comments - any member, oldest first.
pub async fn list_comments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<Vec<CommentBody>>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);

    services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;

    let rows = services.storage.comments.list_by_ticket(ticket.id).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// DELETE .../comments/:comment_id - OWNER or the comment's author.
pub async fn delete_comment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id, comment_id)): Path<(Uuid, Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);
    let comment_id = CommentId::from_uuid(comment_id);

    let membership = services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;
    let comment = services.guard.comment_in_ticket(ticket.id, comment_id).await?;

    can_act_on_comment(
        &membership,
        &CommentRef {
            author_id: comment.user_id,
        },
        user.user_id(),
        CommentAction::Delete,
    )?;

    services.storage.comments.delete(comment.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

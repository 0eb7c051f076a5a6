//! Ticket routes, nested under /projects/:project_id/tickets.
//!
//! Every handler follows the fixed pipeline: membership check, then
//! existence/scope check, then action check, then storage.

use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use uuid::Uuid;

use trackle_auth::{can_act_on_ticket, TicketAction, TicketRef};
use trackle_core::{ProjectId, TicketId};
use trackle_domain::Ticket;

use crate::app::dto::{CreateTicketRequest, PatchTicketRequest, TicketBody};
use crate::app::errors::ApiError;
use crate::app::routes::comments;
use crate::app::services::AppServices;
use crate::context::CurrentUser;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_ticket).get(list_tickets))
        .route(
            "/:ticket_id",
            get(get_ticket).patch(patch_ticket).delete(delete_ticket),
        )
        .route(
            "/:ticket_id/comments",
            post(comments::create_comment).get(comments::list_comments),
        )
        .route(
            "/:ticket_id/comments/:comment_id",
            delete(comments::delete_comment),
        )
}

fn ticket_ref(ticket: &Ticket) -> TicketRef {
    TicketRef {
        reporter_id: ticket.reporter_id,
        assignee_id: ticket.assignee_id,
    }
}

/// POST /projects/:project_id/tickets - any member may file a ticket; the
/// reporter is always the authenticated caller.
pub async fn create_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketBody>), ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;

    let ticket = body.into_ticket(project_id, user.user_id())?;
    services
        .guard
        .validate_assignee(project_id, ticket.assignee_id)
        .await?;

    let ticket = services.storage.tickets.insert(ticket).await?;
    Ok((StatusCode::CREATED, Json(ticket.into())))
}

/// GET /projects/:project_id/tickets - members only, newest first.
pub async fn list_tickets(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path(project_id): Path<Uuid>,
) -> Result<Json<Vec<TicketBody>>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;

    let tickets = services.storage.tickets.list_by_project(project_id).await?;
    Ok(Json(tickets.into_iter().map(Into::into).collect()))
}

/// GET /projects/:project_id/tickets/:id
pub async fn get_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TicketBody>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);

    let membership = services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;
    can_act_on_ticket(&membership, &ticket_ref(&ticket), user.user_id(), TicketAction::Read)?;

    Ok(Json(ticket.into()))
}

/// PATCH /projects/:project_id/tickets/:id - OWNER, reporter or assignee;
/// changing the assignee additionally requires OWNER or reporter.
pub async fn patch_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id)): Path<(Uuid, Uuid)>,
    Json(body): Json<PatchTicketRequest>,
) -> Result<Json<TicketBody>, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);
    let patch = body.into_patch()?;

    let membership = services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let mut ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;

    let action = if patch.reassigns() {
        TicketAction::Reassign
    } else {
        TicketAction::Update
    };
    can_act_on_ticket(&membership, &ticket_ref(&ticket), user.user_id(), action)?;

    if let Some(new_assignee) = patch.assignee_id {
        services.guard.validate_assignee(project_id, new_assignee).await?;
    }

    ticket.apply(patch);
    let ticket = services.storage.tickets.update(ticket).await?;
    Ok(Json(ticket.into()))
}

/// DELETE /projects/:project_id/tickets/:id - OWNER or reporter.
pub async fn delete_ticket(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(user): Extension<CurrentUser>,
    Path((project_id, ticket_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let project_id = ProjectId::from_uuid(project_id);
    let ticket_id = TicketId::from_uuid(ticket_id);

    let membership = services
        .guard
        .require_membership(project_id, user.user_id())
        .await?;
    let ticket = services.guard.ticket_in_project(project_id, ticket_id).await?;
    can_act_on_ticket(&membership, &ticket_ref(&ticket), user.user_id(), TicketAction::Delete)?;

    services.storage.tickets.delete(ticket.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

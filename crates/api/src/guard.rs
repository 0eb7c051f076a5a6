//! API-side access guard.
//!
//! This composes the pure authorization engine (`trackle-auth::engine`) with
//! the storage lookups it decides over, and fixes the mandated ordering:
//! **membership check → resource existence/scope check → role/ownership
//! check**. Handlers call these methods in that order; none of them
//! open-code a role comparison.
//!
//! Consequences of the ordering:
//! - a non-member gets 403 even when the target id does not exist, so
//!   project existence is never leaked;
//! - a member gets 404 (not 403) for ids belonging to a different project
//!   or ticket.

use trackle_auth::{engine, Membership, Role};
use trackle_core::{CommentId, ProjectId, TicketId, UserId};
use trackle_domain::{Comment, Ticket};
use trackle_store::Storage;

use crate::app::errors::ApiError;

#[derive(Clone)]
pub struct AccessGuard {
    storage: Storage,
}

impl AccessGuard {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    /// Membership lookup; absence is a 403, never a 404.
    pub async fn require_membership(
        &self,
        project_id: ProjectId,
        user_id: UserId,
    ) -> Result<Membership, ApiError> {
        let membership = self.storage.memberships.find(project_id, user_id).await?;
        let membership = engine::require_membership(membership.as_ref())?;
        Ok(membership.clone())
    }

    /// Membership plus one of `allowed` roles.
    pub async fn require_role(
        &self,
        project_id: ProjectId,
        user_id: UserId,
        allowed: &[Role],
    ) -> Result<Membership, ApiError> {
        let membership = self.require_membership(project_id, user_id).await?;
        engine::require_role(&membership, allowed)?;
        Ok(membership)
    }

    /// Fetch a ticket through its owning project.
    ///
    /// Call only after `require_membership`. Missing tickets and tickets of
    /// other projects are indistinguishable: both are out of scope.
    pub async fn ticket_in_project(
        &self,
        project_id: ProjectId,
        ticket_id: TicketId,
    ) -> Result<Ticket, ApiError> {
        match self.storage.tickets.find(ticket_id).await? {
            Some(ticket) if ticket.project_id == project_id => Ok(ticket),
            _ => Err(engine::Deny::NotFoundInScope.into()),
        }
    }

    /// Fetch a comment through its owning ticket (same scope rule).
    pub async fn comment_in_ticket(
        &self,
        ticket_id: TicketId,
        comment_id: CommentId,
    ) -> Result<Comment, ApiError> {
        match self.storage.comments.find(comment_id).await? {
            Some(comment) if comment.ticket_id == ticket_id => Ok(comment),
            _ => Err(engine::Deny::NotFoundInScope.into()),
        }
    }

    /// A non-null assignee must hold a membership in the project.
    pub async fn validate_assignee(
        &self,
        project_id: ProjectId,
        assignee_id: Option<UserId>,
    ) -> Result<(), ApiError> {
        let Some(assignee_id) = assignee_id else {
            return Ok(());
        };
        let membership = self.storage.memberships.find(project_id, assignee_id).await?;
        engine::validate_assignee(membership.as_ref())?;
        Ok(())
    }
}

//! Request/response DTOs and JSON mapping helpers.
//!
//! Request bodies are schema-checked here before any business logic runs;
//! auth bodies report structured field-level errors. Responses use the
//! camelCase wire names clients expect.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use trackle_auth::{Membership, Role};
use trackle_core::{CommentId, ProjectId, TicketId, UserId};
use trackle_domain::{
    ticket, Comment, Project, Ticket, TicketKind, TicketPatch, TicketPriority, TicketStatus, User,
};

use crate::app::errors::{ApiError, FieldError};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !self.email.contains('@') {
            errors.push(FieldError::new("email", "email is invalid"));
        }
        if self.password.len() < 8 {
            errors.push(FieldError::new(
                "password",
                "password must be at least 8 characters",
            ));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::fields(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), ApiError> {
        let mut errors = Vec::new();
        if !self.email.contains('@') {
            errors.push(FieldError::new("email", "email is invalid"));
        }
        if self.password.is_empty() {
            errors.push(FieldError::new("password", "password is required"));
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::fields(errors))
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub title: String,
    pub description: String,
    pub priority: Option<TicketPriority>,
    #[serde(rename = "type")]
    pub kind: Option<TicketKind>,
    pub assignee_id: Option<Uuid>,
}

impl CreateTicketRequest {
    pub fn into_ticket(self, project_id: ProjectId, reporter_id: UserId) -> Result<Ticket, ApiError> {
        Ok(Ticket::new(
            project_id,
            reporter_id,
            &self.title,
            &self.description,
            self.priority,
            self.kind,
            self.assignee_id.map(UserId::from_uuid),
        )?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatchTicketRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    #[serde(rename = "type")]
    pub kind: Option<TicketKind>,
    /// Absent: leave unchanged. Present-as-null: clear the assignee.
    #[serde(default, deserialize_with = "double_option")]
    pub assignee_id: Option<Option<Uuid>>,
}

impl PatchTicketRequest {
    pub fn into_patch(self) -> Result<TicketPatch, ApiError> {
        let patch = TicketPatch {
            title: self.title.as_deref().map(ticket::validate_title).transpose()?,
            description: self
                .description
                .as_deref()
                .map(ticket::validate_description)
                .transpose()?,
            status: self.status,
            priority: self.priority,
            kind: self.kind,
            assignee_id: self
                .assignee_id
                .map(|inner| inner.map(UserId::from_uuid)),
        };

        if patch.is_empty() {
            return Err(ApiError::validation("at least one field must be provided"));
        }
        Ok(patch)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Distinguish an absent field from an explicit `null`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisteredUserBody {
    pub id: UserId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for RegisteredUserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PublicUserBody {
    pub id: UserId,
    pub email: String,
}

impl From<User> for PublicUserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginBody {
    pub access_token: String,
    pub user: PublicUserBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummaryBody {
    pub id: ProjectId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Project> for ProjectSummaryBody {
    fn from(project: Project) -> Self {
        Self {
            id: project.id,
            name: project.name,
            owner_id: project.owner_id,
            created_at: project.created_at,
            updated_at: project.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectBody {
    #[serde(flatten)]
    pub project: ProjectSummaryBody,
    pub my_role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectListItemBody {
    #[serde(flatten)]
    pub project: ProjectSummaryBody,
    pub my_role: Role,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberBody {
    pub role: Role,
    pub joined_at: DateTime<Utc>,
    pub user: PublicUserBody,
}

impl From<(Membership, User)> for MemberBody {
    fn from((membership, user): (Membership, User)) -> Self {
        Self {
            role: membership.role,
            joined_at: membership.joined_at,
            user: user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectDetailBody {
    #[serde(flatten)]
    pub project: ProjectSummaryBody,
    pub members: Vec<MemberBody>,
    pub my_role: Role,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberListItemBody {
    pub user: PublicUserBody,
    pub project: ProjectSummaryBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketBody {
    pub id: TicketId,
    pub project_id: ProjectId,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    #[serde(rename = "type")]
    pub kind: TicketKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketBody {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            project_id: ticket.project_id,
            reporter_id: ticket.reporter_id,
            assignee_id: ticket.assignee_id,
            title: ticket.title,
            description: ticket.description,
            status: ticket.status,
            priority: ticket.priority,
            kind: ticket.kind,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentBody {
    pub id: CommentId,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub user: PublicUserBody,
}

impl From<(Comment, User)> for CommentBody {
    fn from((comment, user): (Comment, User)) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            created_at: comment.created_at,
            user: user.into(),
        }
    }
}

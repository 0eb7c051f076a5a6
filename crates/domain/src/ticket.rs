use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackle_core::{DomainError, DomainResult, ProjectId, TicketId, UserId};

pub const TITLE_MAX: usize = 100;
pub const DESCRIPTION_MAX: usize = 1000;

/// Ticket workflow status.
///
/// All transitions between states are permitted for any update-authorized
/// caller; there is deliberately no transition graph yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    #[default]
    Open,
    InProgress,
    Resolved,
    Closed,
}

/// Ticket priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketPriority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Ticket kind: defect report or feature/work request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketKind {
    Bug,
    #[default]
    Request,
}

/// A ticket, owned by exactly one project.
///
/// # Invariants
/// - `project_id` must match the project the ticket is reached through.
/// - `reporter_id` is the authenticated creator, never client-supplied.
/// - `assignee_id`, when set, must denote a current member of the same
///   project. That check needs the membership directory and is enforced by
///   the access guard before a ticket is stored or patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    pub project_id: ProjectId,
    pub reporter_id: UserId,
    pub assignee_id: Option<UserId>,
    pub title: String,
    pub description: String,
    pub status: TicketStatus,
    pub priority: TicketPriority,
    pub kind: TicketKind,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ticket {
    pub fn new(
        project_id: ProjectId,
        reporter_id: UserId,
        title: &str,
        description: &str,
        priority: Option<TicketPriority>,
        kind: Option<TicketKind>,
        assignee_id: Option<UserId>,
    ) -> DomainResult<Self> {
        let title = validate_title(title)?;
        let description = validate_description(description)?;

        let now = Utc::now();
        Ok(Self {
            id: TicketId::new(),
            project_id,
            reporter_id,
            assignee_id,
            title,
            description,
            status: TicketStatus::Open,
            priority: priority.unwrap_or_default(),
            kind: kind.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Apply a validated patch and bump `updated_at`.
    pub fn apply(&mut self, patch: TicketPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(kind) = patch.kind {
            self.kind = kind;
        }
        if let Some(assignee_id) = patch.assignee_id {
            self.assignee_id = assignee_id;
        }
        self.updated_at = Utc::now();
    }
}

/// Partial update to a ticket.
///
/// `assignee_id` is doubly optional: `None` leaves the assignee untouched,
/// `Some(None)` clears it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TicketPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TicketStatus>,
    pub priority: Option<TicketPriority>,
    pub kind: Option<TicketKind>,
    pub assignee_id: Option<Option<UserId>>,
}

impl TicketPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.kind.is_none()
            && self.assignee_id.is_none()
    }

    /// Whether this patch changes the assignee (the stricter `reassign`
    /// permission applies).
    pub fn reassigns(&self) -> bool {
        self.assignee_id.is_some()
    }
}

pub fn validate_title(title: &str) -> DomainResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(DomainError::validation("title is required"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(DomainError::validation(format!(
            "title must be at most {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

pub fn validate_description(description: &str) -> DomainResult<String> {
    let description = description.trim();
    if description.is_empty() {
        return Err(DomainError::validation("description is required"));
    }
    if description.chars().count() > DESCRIPTION_MAX {
        return Err(DomainError::validation(format!(
            "description must be at most {DESCRIPTION_MAX} characters"
        )));
    }
    Ok(description.to_string())
}

//! Repository contracts.
//!
//! Every method is keyed the way the access model needs it: memberships by
//! the composite (project, user), tickets by project, comments by ticket.

use async_trait::async_trait;

use trackle_auth::Membership;
use trackle_core::{CommentId, ProjectId, TicketId, UserId};
use trackle_domain::{Comment, Project, Ticket, User};

use crate::StoreResult;

/// User records (the identity store).
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Insert a new user. `Conflict` if the (normalized) email is taken.
    async fn create_user(&self, user: User) -> StoreResult<User>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>>;
}

/// The membership directory: the many-to-many relation between users and
/// projects, with a role. The authorization engine decides over rows fetched
/// from here.
#[async_trait]
pub trait MembershipDirectory: Send + Sync {
    /// Lookup by the composite key. `None` means no visibility at all.
    async fn find(&self, project_id: ProjectId, user_id: UserId) -> StoreResult<Option<Membership>>;

    /// Add a membership row. `Conflict` if one already exists for the pair.
    ///
    /// The OWNER row at project creation does not go through here; it is
    /// written inside `ProjectStore::create_with_owner` so both rows share
    /// one atomic unit.
    async fn add_member(&self, membership: Membership) -> StoreResult<Membership>;

    /// Memberships of a project joined with their users. Stable order
    /// (joined_at, then user id).
    async fn list_by_project(&self, project_id: ProjectId)
        -> StoreResult<Vec<(Membership, User)>>;

    /// Memberships of a user joined with their projects, newest first.
    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<(Membership, Project)>>;
}

/// Project records.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    /// Create the project and its creator's OWNER membership atomically:
    /// both rows land or neither does.
    async fn create_with_owner(&self, project: Project) -> StoreResult<(Project, Membership)>;

    async fn find(&self, id: ProjectId) -> StoreResult<Option<Project>>;

    /// Delete the project and cascade to its tickets, their comments, and
    /// all membership rows, in one atomic unit. No orphans remain.
    async fn delete_cascading(&self, id: ProjectId) -> StoreResult<()>;
}

/// Ticket records.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn insert(&self, ticket: Ticket) -> StoreResult<Ticket>;

    async fn find(&self, id: TicketId) -> StoreResult<Option<Ticket>>;

    /// Tickets of a project, newest first.
    async fn list_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Ticket>>;

    /// Persist a modified ticket. `NotFound` if it no longer exists.
    async fn update(&self, ticket: Ticket) -> StoreResult<Ticket>;

    /// Delete a ticket and its comments.
    async fn delete(&self, id: TicketId) -> StoreResult<()>;
}

/// Comment records.
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn insert(&self, comment: Comment) -> StoreResult<Comment>;

    async fn find(&self, id: CommentId) -> StoreResult<Option<Comment>>;

    /// Comments of a ticket joined with their authors, oldest first.
    async fn list_by_ticket(&self, ticket_id: TicketId) -> StoreResult<Vec<(Comment, User)>>;

    async fn delete(&self, id: CommentId) -> StoreResult<()>;
}

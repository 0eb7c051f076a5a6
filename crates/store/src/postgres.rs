//! Postgres backend.
//!
//! ## Error mapping
//!
//! SQLx errors map to `StoreError` as follows: unique violations (`23505`)
//! become `Conflict`, `RowNotFound` becomes `NotFound`, everything else
//! becomes `Backend` and is surfaced as a generic internal error at the API
//! boundary.
//!
//! ## Atomicity
//!
//! Project creation writes the project row and the creator's OWNER
//! membership in one transaction. Deletion relies on `ON DELETE CASCADE`
//! foreign keys, so a single `DELETE FROM projects` removes tickets,
//! comments and memberships atomically.
//!
//! ## Thread safety
//!
//! `PostgresStore` is `Send + Sync`; the SQLx pool handles connection
//! management across tasks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use trackle_auth::{Membership, Role};
use trackle_core::{CommentId, ProjectId, TicketId, UserId};
use trackle_domain::{
    normalize_email, Comment, Project, Ticket, TicketKind, TicketPriority, TicketStatus, User,
};

use crate::error::{StoreError, StoreResult};
use crate::traits::{CommentStore, IdentityStore, MembershipDirectory, ProjectStore, TicketStore};

/// Logical tables: users, projects, project_members (composite key), tickets,
/// comments. Foreign keys enforce the ownership edges and cascade deletes.
const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS projects (
    id UUID PRIMARY KEY,
    name TEXT NOT NULL,
    owner_id UUID NOT NULL REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS project_members (
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    role TEXT NOT NULL,
    joined_at TIMESTAMPTZ NOT NULL,
    PRIMARY KEY (project_id, user_id)
);

CREATE TABLE IF NOT EXISTS tickets (
    id UUID PRIMARY KEY,
    project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
    reporter_id UUID NOT NULL REFERENCES users(id),
    assignee_id UUID REFERENCES users(id),
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    status TEXT NOT NULL,
    priority TEXT NOT NULL,
    kind TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL,
    updated_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS comments (
    id UUID PRIMARY KEY,
    ticket_id UUID NOT NULL REFERENCES tickets(id) ON DELETE CASCADE,
    user_id UUID NOT NULL REFERENCES users(id),
    content TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL
);
"#;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the tables if they do not exist yet.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        Ok(())
    }
}

fn role_to_str(role: Role) -> &'static str {
    role.as_str()
}

fn role_from_str(s: &str) -> StoreResult<Role> {
    match s {
        "OWNER" => Ok(Role::Owner),
        "MEMBER" => Ok(Role::Member),
        other => Err(StoreError::Backend(format!("unknown role {other:?}"))),
    }
}

fn status_to_str(status: TicketStatus) -> &'static str {
    match status {
        TicketStatus::Open => "OPEN",
        TicketStatus::InProgress => "IN_PROGRESS",
        TicketStatus::Resolved => "RESOLVED",
        TicketStatus::Closed => "CLOSED",
    }
}

fn status_from_str(s: &str) -> StoreResult<TicketStatus> {
    match s {
        "OPEN" => Ok(TicketStatus::Open),
        "IN_PROGRESS" => Ok(TicketStatus::InProgress),
        "RESOLVED" => Ok(TicketStatus::Resolved),
        "CLOSED" => Ok(TicketStatus::Closed),
        other => Err(StoreError::Backend(format!("unknown status {other:?}"))),
    }
}

fn priority_to_str(priority: TicketPriority) -> &'static str {
    match priority {
        TicketPriority::Low => "LOW",
        TicketPriority::Medium => "MEDIUM",
        TicketPriority::High => "HIGH",
        TicketPriority::Urgent => "URGENT",
    }
}

fn priority_from_str(s: &str) -> StoreResult<TicketPriority> {
    match s {
        "LOW" => Ok(TicketPriority::Low),
        "MEDIUM" => Ok(TicketPriority::Medium),
        "HIGH" => Ok(TicketPriority::High),
        "URGENT" => Ok(TicketPriority::Urgent),
        other => Err(StoreError::Backend(format!("unknown priority {other:?}"))),
    }
}

fn kind_to_str(kind: TicketKind) -> &'static str {
    match kind {
        TicketKind::Bug => "BUG",
        TicketKind::Request => "REQUEST",
    }
}

fn kind_from_str(s: &str) -> StoreResult<TicketKind> {
    match s {
        "BUG" => Ok(TicketKind::Bug),
        "REQUEST" => Ok(TicketKind::Request),
        other => Err(StoreError::Backend(format!("unknown kind {other:?}"))),
    }
}

fn user_from_row(row: &PgRow) -> StoreResult<User> {
    Ok(User {
        id: UserId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::from)?),
        email: row.try_get("email").map_err(StoreError::from)?,
        password_hash: row.try_get("password_hash").map_err(StoreError::from)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StoreError::from)?,
    })
}

fn project_from_row(row: &PgRow) -> StoreResult<Project> {
    Ok(Project {
        id: ProjectId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::from)?),
        name: row.try_get("name").map_err(StoreError::from)?,
        owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id").map_err(StoreError::from)?),
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StoreError::from)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(StoreError::from)?,
    })
}

fn membership_from_row(row: &PgRow) -> StoreResult<Membership> {
    Ok(Membership {
        project_id: ProjectId::from_uuid(
            row.try_get::<Uuid, _>("project_id").map_err(StoreError::from)?,
        ),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").map_err(StoreError::from)?),
        role: role_from_str(row.try_get::<String, _>("role").map_err(StoreError::from)?.as_str())?,
        joined_at: row
            .try_get::<DateTime<Utc>, _>("joined_at")
            .map_err(StoreError::from)?,
    })
}

fn ticket_from_row(row: &PgRow) -> StoreResult<Ticket> {
    Ok(Ticket {
        id: TicketId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::from)?),
        project_id: ProjectId::from_uuid(
            row.try_get::<Uuid, _>("project_id").map_err(StoreError::from)?,
        ),
        reporter_id: UserId::from_uuid(
            row.try_get::<Uuid, _>("reporter_id").map_err(StoreError::from)?,
        ),
        assignee_id: row
            .try_get::<Option<Uuid>, _>("assignee_id")
            .map_err(StoreError::from)?
            .map(UserId::from_uuid),
        title: row.try_get("title").map_err(StoreError::from)?,
        description: row.try_get("description").map_err(StoreError::from)?,
        status: status_from_str(row.try_get::<String, _>("status").map_err(StoreError::from)?.as_str())?,
        priority: priority_from_str(
            row.try_get::<String, _>("priority").map_err(StoreError::from)?.as_str(),
        )?,
        kind: kind_from_str(row.try_get::<String, _>("kind").map_err(StoreError::from)?.as_str())?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StoreError::from)?,
        updated_at: row
            .try_get::<DateTime<Utc>, _>("updated_at")
            .map_err(StoreError::from)?,
    })
}

fn comment_from_row(row: &PgRow) -> StoreResult<Comment> {
    Ok(Comment {
        id: CommentId::from_uuid(row.try_get::<Uuid, _>("id").map_err(StoreError::from)?),
        ticket_id: TicketId::from_uuid(
            row.try_get::<Uuid, _>("ticket_id").map_err(StoreError::from)?,
        ),
        user_id: UserId::from_uuid(row.try_get::<Uuid, _>("user_id").map_err(StoreError::from)?),
        content: row.try_get("content").map_err(StoreError::from)?,
        created_at: row
            .try_get::<DateTime<Utc>, _>("created_at")
            .map_err(StoreError::from)?,
    })
}

#[async_trait]
impl IdentityStore for PostgresStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        sqlx::query(
            "INSERT INTO users (id, email, password_hash, created_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("email already used".into()),
            other => other,
        })?;
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl MembershipDirectory for PostgresStore {
    async fn find(&self, project_id: ProjectId, user_id: UserId) -> StoreResult<Option<Membership>> {
        let row =
            sqlx::query("SELECT * FROM project_members WHERE project_id = $1 AND user_id = $2")
                .bind(project_id.as_uuid())
                .bind(user_id.as_uuid())
                .fetch_optional(&self.pool)
                .await?;
        row.as_ref().map(membership_from_row).transpose()
    }

    async fn add_member(&self, membership: Membership) -> StoreResult<Membership> {
        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(membership.project_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(role_to_str(membership.role))
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::Conflict(_) => StoreError::Conflict("membership already exists".into()),
            other => other,
        })?;
        Ok(membership)
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> StoreResult<Vec<(Membership, User)>> {
        let rows = sqlx::query(
            "SELECT m.project_id, m.user_id, m.role, m.joined_at, \
                    u.id, u.email, u.password_hash, u.created_at \
             FROM project_members m JOIN users u ON u.id = m.user_id \
             WHERE m.project_id = $1 \
             ORDER BY m.joined_at ASC, m.user_id ASC",
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((membership_from_row(row)?, user_from_row(row)?)))
            .collect()
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<(Membership, Project)>> {
        let rows = sqlx::query(
            "SELECT m.project_id, m.user_id, m.role, m.joined_at, \
                    p.id, p.name, p.owner_id, p.created_at, p.updated_at \
             FROM project_members m JOIN projects p ON p.id = m.project_id \
             WHERE m.user_id = $1 \
             ORDER BY m.joined_at DESC",
        )
        .bind(user_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| Ok((membership_from_row(row)?, project_from_row(row)?)))
            .collect()
    }
}

#[async_trait]
impl ProjectStore for PostgresStore {
    async fn create_with_owner(&self, project: Project) -> StoreResult<(Project, Membership)> {
        let membership = Membership::new(project.id, project.owner_id, Role::Owner);

        let mut tx = self.pool.begin().await?;
        sqlx::query(
            "INSERT INTO projects (id, name, owner_id, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(project.id.as_uuid())
        .bind(&project.name)
        .bind(project.owner_id.as_uuid())
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO project_members (project_id, user_id, role, joined_at) \
             VALUES ($1, $2, $3, $4)",
        )
        .bind(membership.project_id.as_uuid())
        .bind(membership.user_id.as_uuid())
        .bind(role_to_str(membership.role))
        .bind(membership.joined_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;

        Ok((project, membership))
    }

    async fn find(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(project_from_row).transpose()
    }

    async fn delete_cascading(&self, id: ProjectId) -> StoreResult<()> {
        // Foreign keys cascade tickets -> comments and memberships, so this
        // single statement is the whole atomic unit.
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl TicketStore for PostgresStore {
    async fn insert(&self, ticket: Ticket) -> StoreResult<Ticket> {
        sqlx::query(
            "INSERT INTO tickets (id, project_id, reporter_id, assignee_id, title, description, \
                                  status, priority, kind, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)",
        )
        .bind(ticket.id.as_uuid())
        .bind(ticket.project_id.as_uuid())
        .bind(ticket.reporter_id.as_uuid())
        .bind(ticket.assignee_id.map(|id| *id.as_uuid()))
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(status_to_str(ticket.status))
        .bind(priority_to_str(ticket.priority))
        .bind(kind_to_str(ticket.kind))
        .bind(ticket.created_at)
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(ticket)
    }

    async fn find(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        let row = sqlx::query("SELECT * FROM tickets WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(ticket_from_row).transpose()
    }

    async fn list_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Ticket>> {
        let rows = sqlx::query(
            "SELECT * FROM tickets WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(ticket_from_row).collect()
    }

    async fn update(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let result = sqlx::query(
            "UPDATE tickets SET assignee_id = $2, title = $3, description = $4, status = $5, \
                                priority = $6, kind = $7, updated_at = $8 \
             WHERE id = $1",
        )
        .bind(ticket.id.as_uuid())
        .bind(ticket.assignee_id.map(|id| *id.as_uuid()))
        .bind(&ticket.title)
        .bind(&ticket.description)
        .bind(status_to_str(ticket.status))
        .bind(priority_to_str(ticket.priority))
        .bind(kind_to_str(ticket.kind))
        .bind(ticket.updated_at)
        .execute(&self.pool)
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(ticket)
    }

    async fn delete(&self, id: TicketId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM tickets WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl CommentStore for PostgresStore {
    async fn insert(&self, comment: Comment) -> StoreResult<Comment> {
        sqlx::query(
            "INSERT INTO comments (id, ticket_id, user_id, content, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(comment.id.as_uuid())
        .bind(comment.ticket_id.as_uuid())
        .bind(comment.user_id.as_uuid())
        .bind(&comment.content)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;
        Ok(comment)
    }

    async fn find(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        let row = sqlx::query("SELECT * FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(comment_from_row).transpose()
    }

    async fn list_by_ticket(&self, ticket_id: TicketId) -> StoreResult<Vec<(Comment, User)>> {
        // Author columns are aliased: `id`/`created_at` would otherwise
        // collide with the comment's own columns.
        let rows = sqlx::query(
            "SELECT c.id, c.ticket_id, c.user_id, c.content, c.created_at, \
                    u.id AS author_id, u.email AS author_email, \
                    u.password_hash AS author_password_hash, \
                    u.created_at AS author_created_at \
             FROM comments c JOIN users u ON u.id = c.user_id \
             WHERE c.ticket_id = $1 \
             ORDER BY c.created_at ASC",
        )
        .bind(ticket_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let author = User {
                    id: UserId::from_uuid(
                        row.try_get::<Uuid, _>("author_id").map_err(StoreError::from)?,
                    ),
                    email: row.try_get("author_email").map_err(StoreError::from)?,
                    password_hash: row
                        .try_get("author_password_hash")
                        .map_err(StoreError::from)?,
                    created_at: row
                        .try_get::<DateTime<Utc>, _>("author_created_at")
                        .map_err(StoreError::from)?,
                };
                Ok((comment_from_row(row)?, author))
            })
            .collect()
    }

    async fn delete(&self, id: CommentId) -> StoreResult<()> {
        let result = sqlx::query("DELETE FROM comments WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

//! In-memory backend for tests and dev.
//!
//! One `RwLock` guards all tables, so every multi-row operation (project +
//! OWNER membership creation, cascading deletes) is naturally atomic.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use trackle_auth::Membership;
use trackle_core::{CommentId, ProjectId, TicketId, UserId};
use trackle_domain::{normalize_email, Comment, Project, Ticket, User};

use crate::error::{StoreError, StoreResult};
use crate::traits::{CommentStore, IdentityStore, MembershipDirectory, ProjectStore, TicketStore};

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<UserId, User>,
    projects: HashMap<ProjectId, Project>,
    memberships: HashMap<(ProjectId, UserId), Membership>,
    tickets: HashMap<TicketId, Ticket>,
    comments: HashMap<CommentId, Comment>,
}

#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<std::sync::RwLockReadGuard<'_, Tables>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<std::sync::RwLockWriteGuard<'_, Tables>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend("store lock poisoned".into()))
    }
}

#[async_trait]
impl IdentityStore for InMemoryStore {
    async fn create_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(StoreError::Conflict("email already used".into()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let email = normalize_email(email);
        let tables = self.read()?;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}

#[async_trait]
impl MembershipDirectory for InMemoryStore {
    async fn find(&self, project_id: ProjectId, user_id: UserId) -> StoreResult<Option<Membership>> {
        Ok(self.read()?.memberships.get(&(project_id, user_id)).cloned())
    }

    async fn add_member(&self, membership: Membership) -> StoreResult<Membership> {
        let mut tables = self.write()?;
        let key = (membership.project_id, membership.user_id);
        if tables.memberships.contains_key(&key) {
            return Err(StoreError::Conflict("membership already exists".into()));
        }
        tables.memberships.insert(key, membership.clone());
        Ok(membership)
    }

    async fn list_by_project(
        &self,
        project_id: ProjectId,
    ) -> StoreResult<Vec<(Membership, User)>> {
        let tables = self.read()?;
        let mut rows: Vec<(Membership, User)> = tables
            .memberships
            .values()
            .filter(|m| m.project_id == project_id)
            .filter_map(|m| tables.users.get(&m.user_id).map(|u| (m.clone(), u.clone())))
            .collect();
        rows.sort_by(|(a, _), (b, _)| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.user_id.as_uuid().cmp(b.user_id.as_uuid()))
        });
        Ok(rows)
    }

    async fn list_by_user(&self, user_id: UserId) -> StoreResult<Vec<(Membership, Project)>> {
        let tables = self.read()?;
        let mut rows: Vec<(Membership, Project)> = tables
            .memberships
            .values()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                tables
                    .projects
                    .get(&m.project_id)
                    .map(|p| (m.clone(), p.clone()))
            })
            .collect();
        rows.sort_by(|(a, _), (b, _)| b.joined_at.cmp(&a.joined_at));
        Ok(rows)
    }
}

#[async_trait]
impl ProjectStore for InMemoryStore {
    async fn create_with_owner(&self, project: Project) -> StoreResult<(Project, Membership)> {
        let mut tables = self.write()?;
        let membership = Membership::new(
            project.id,
            project.owner_id,
            trackle_auth::Role::Owner,
        );
        tables.projects.insert(project.id, project.clone());
        tables
            .memberships
            .insert((membership.project_id, membership.user_id), membership.clone());
        Ok((project, membership))
    }

    async fn find(&self, id: ProjectId) -> StoreResult<Option<Project>> {
        Ok(self.read()?.projects.get(&id).cloned())
    }

    async fn delete_cascading(&self, id: ProjectId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.projects.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }

        let ticket_ids: Vec<TicketId> = tables
            .tickets
            .values()
            .filter(|t| t.project_id == id)
            .map(|t| t.id)
            .collect();
        tables
            .comments
            .retain(|_, c| !ticket_ids.contains(&c.ticket_id));
        tables.tickets.retain(|_, t| t.project_id != id);
        tables.memberships.retain(|(p, _), _| *p != id);
        Ok(())
    }
}

#[async_trait]
impl TicketStore for InMemoryStore {
    async fn insert(&self, ticket: Ticket) -> StoreResult<Ticket> {
        self.write()?.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn find(&self, id: TicketId) -> StoreResult<Option<Ticket>> {
        Ok(self.read()?.tickets.get(&id).cloned())
    }

    async fn list_by_project(&self, project_id: ProjectId) -> StoreResult<Vec<Ticket>> {
        let tables = self.read()?;
        let mut rows: Vec<Ticket> = tables
            .tickets
            .values()
            .filter(|t| t.project_id == project_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update(&self, ticket: Ticket) -> StoreResult<Ticket> {
        let mut tables = self.write()?;
        if !tables.tickets.contains_key(&ticket.id) {
            return Err(StoreError::NotFound);
        }
        tables.tickets.insert(ticket.id, ticket.clone());
        Ok(ticket)
    }

    async fn delete(&self, id: TicketId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.tickets.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        tables.comments.retain(|_, c| c.ticket_id != id);
        Ok(())
    }
}

#[async_trait]
impl CommentStore for InMemoryStore {
    async fn insert(&self, comment: Comment) -> StoreResult<Comment> {
        self.write()?.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find(&self, id: CommentId) -> StoreResult<Option<Comment>> {
        Ok(self.read()?.comments.get(&id).cloned())
    }

    async fn list_by_ticket(&self, ticket_id: TicketId) -> StoreResult<Vec<(Comment, User)>> {
        let tables = self.read()?;
        let mut rows: Vec<(Comment, User)> = tables
            .comments
            .values()
            .filter(|c| c.ticket_id == ticket_id)
            .filter_map(|c| tables.users.get(&c.user_id).map(|u| (c.clone(), u.clone())))
            .collect();
        rows.sort_by(|(a, _), (b, _)| a.created_at.cmp(&b.created_at));
        Ok(rows)
    }

    async fn delete(&self, id: CommentId) -> StoreResult<()> {
        let mut tables = self.write()?;
        if tables.comments.remove(&id).is_none() {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use trackle_auth::Role;

    use super::*;

    async fn seed_user(store: &InMemoryStore, email: &str) -> User {
        store
            .create_user(User::new(email, "hash".into()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict_case_insensitively() {
        let store = InMemoryStore::new();
        seed_user(&store, "a@x.com").await;

        let err = store
            .create_user(User::new("A@X.com", "hash".into()).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let found = store.find_user_by_email("A@X.COM").await.unwrap();
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn project_creation_yields_exactly_one_owner_membership() {
        let store = InMemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let project = Project::new("Infra", owner.id).unwrap();

        let (project, membership) = store.create_with_owner(project).await.unwrap();
        assert_eq!(membership.role, Role::Owner);
        assert_eq!(membership.user_id, owner.id);

        let members = MembershipDirectory::list_by_project(&store, project.id)
            .await
            .unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].0.role, Role::Owner);
    }

    #[tokio::test]
    async fn cascade_delete_leaves_no_orphans() {
        let store = InMemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let (project, _) = store
            .create_with_owner(Project::new("Infra", owner.id).unwrap())
            .await
            .unwrap();

        let ticket = TicketStore::insert(
            &store,
            Ticket::new(project.id, owner.id, "Fix bug", "desc", None, None, None).unwrap(),
        )
        .await
        .unwrap();
        CommentStore::insert(&store, Comment::new(ticket.id, owner.id, "first").unwrap())
            .await
            .unwrap();

        store.delete_cascading(project.id).await.unwrap();

        assert!(ProjectStore::find(&store, project.id).await.unwrap().is_none());
        assert!(TicketStore::find(&store, ticket.id).await.unwrap().is_none());
        assert!(store.list_by_ticket(ticket.id).await.unwrap().is_empty());
        assert!(
            MembershipDirectory::find(&store, project.id, owner.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(store.list_by_user(owner.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_ticket_removes_its_comments() {
        let store = InMemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let (project, _) = store
            .create_with_owner(Project::new("Infra", owner.id).unwrap())
            .await
            .unwrap();
        let ticket = TicketStore::insert(
            &store,
            Ticket::new(project.id, owner.id, "t", "d", None, None, None).unwrap(),
        )
        .await
        .unwrap();
        CommentStore::insert(&store, Comment::new(ticket.id, owner.id, "c").unwrap())
            .await
            .unwrap();

        TicketStore::delete(&store, ticket.id).await.unwrap();
        assert!(store.list_by_ticket(ticket.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn user_projects_are_listed_newest_membership_first() {
        let store = InMemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;

        let (first, _) = store
            .create_with_owner(Project::new("First", owner.id).unwrap())
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (second, _) = store
            .create_with_owner(Project::new("Second", owner.id).unwrap())
            .await
            .unwrap();

        let listed = store.list_by_user(owner.id).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].1.id, second.id);
        assert_eq!(listed[1].1.id, first.id);
    }

    #[tokio::test]
    async fn duplicate_membership_is_a_conflict() {
        let store = InMemoryStore::new();
        let owner = seed_user(&store, "a@x.com").await;
        let member = seed_user(&store, "b@x.com").await;
        let (project, _) = store
            .create_with_owner(Project::new("Infra", owner.id).unwrap())
            .await
            .unwrap();

        store
            .add_member(Membership::new(project.id, member.id, Role::Member))
            .await
            .unwrap();
        let err = store
            .add_member(Membership::new(project.id, member.id, Role::Member))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }
}

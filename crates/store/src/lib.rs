//! `trackle-store` — persistence for users, projects, memberships, tickets
//! and comments.
//!
//! The membership directory and entity repositories are trait contracts; two
//! backends implement them: an in-memory store (tests, dev) and a Postgres
//! store (`sqlx`). Both uphold the same atomicity guarantees: project
//! creation inserts the OWNER membership in the same atomic unit, and project
//! deletion cascades to tickets, comments and memberships.

pub mod error;
pub mod in_memory;
pub mod postgres;
pub mod traits;

use std::sync::Arc;

pub use error::{StoreError, StoreResult};
pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use traits::{CommentStore, IdentityStore, MembershipDirectory, ProjectStore, TicketStore};

/// Handle bundle passed to services at process start.
///
/// Constructed once in `main` and injected everywhere; there is no ambient
/// global storage client.
#[derive(Clone)]
pub struct Storage {
    pub users: Arc<dyn IdentityStore>,
    pub projects: Arc<dyn ProjectStore>,
    pub memberships: Arc<dyn MembershipDirectory>,
    pub tickets: Arc<dyn TicketStore>,
    pub comments: Arc<dyn CommentStore>,
}

impl Storage {
    pub fn in_memory() -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            users: store.clone(),
            projects: store.clone(),
            memberships: store.clone(),
            tickets: store.clone(),
            comments: store,
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(PostgresStore::new(pool));
        Self {
            users: store.clone(),
            projects: store.clone(),
            memberships: store.clone(),
            tickets: store.clone(),
            comments: store,
        }
    }
}

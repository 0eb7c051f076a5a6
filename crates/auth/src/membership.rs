use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackle_core::{ProjectId, UserId};

use crate::Role;

/// A user's membership in a project.
///
/// This is the authoritative access-control record: a user with no membership
/// row for a project has zero visibility into it, including its existence.
/// Exactly one membership exists per (project, user) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Membership {
    pub project_id: ProjectId,
    pub user_id: UserId,
    pub role: Role,
    pub joined_at: DateTime<Utc>,
}

impl Membership {
    pub fn new(project_id: ProjectId, user_id: UserId, role: Role) -> Self {
        Self {
            project_id,
            user_id,
            role,
            joined_at: Utc::now(),
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}

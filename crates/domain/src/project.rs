use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackle_core::{DomainError, DomainResult, ProjectId, UserId};

/// A project: the visibility boundary of the tracker.
///
/// `owner_id` records who created the project and is informational only.
/// Authority always comes from the membership row (see `trackle-auth`);
/// nothing may infer access from `owner_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: &str, owner_id: UserId) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name is required"));
        }

        let now = Utc::now();
        Ok(Self {
            id: ProjectId::new(),
            name: name.to_string(),
            owner_id,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_trimmed() {
        let project = Project::new("  Infra  ", UserId::new()).unwrap();
        assert_eq!(project.name, "Infra");
    }

    #[test]
    fn blank_name_is_rejected() {
        assert!(Project::new("   ", UserId::new()).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackle_core::{CommentId, DomainError, DomainResult, TicketId, UserId};

pub const CONTENT_MAX: usize = 500;

/// A comment on a ticket.
///
/// `user_id` is the authenticated author. The owning `ticket_id` must match
/// the ticket the comment is reached through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub ticket_id: TicketId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(ticket_id: TicketId, user_id: UserId, content: &str) -> DomainResult<Self> {
        let content = content.trim();
        if content.is_empty() {
            return Err(DomainError::validation("content is required"));
        }
        if content.chars().count() > CONTENT_MAX {
            return Err(DomainError::validation(format!(
                "content must be at most {CONTENT_MAX} characters"
            )));
        }

        Ok(Self {
            id: CommentId::new(),
            ticket_id,
            user_id,
            content: content.to_string(),
            created_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_is_trimmed_and_bounded() {
        let comment = Comment::new(TicketId::new(), UserId::new(), "  hello  ").unwrap();
        assert_eq!(comment.content, "hello");

        assert!(Comment::new(TicketId::new(), UserId::new(), "   ").is_err());
        assert!(Comment::new(TicketId::new(), UserId::new(), &"x".repeat(CONTENT_MAX + 1)).is_err());
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use trackle_core::{DomainError, DomainResult, UserId};

/// A registered account.
///
/// Users are created at registration and never mutated or deleted in scope.
/// The password hash is opaque here; hashing/verification is `trackle-auth`'s
/// concern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a user from an already-hashed credential.
    ///
    /// The email is normalized (trimmed, lowercased) so that uniqueness is
    /// case-insensitive.
    pub fn new(email: &str, password_hash: String) -> DomainResult<Self> {
        let email = normalize_email(email);
        if !is_plausible_email(&email) {
            return Err(DomainError::validation("email is invalid"));
        }

        Ok(Self {
            id: UserId::new(),
            email,
            password_hash,
            created_at: Utc::now(),
        })
    }
}

/// Canonical form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// Intentionally loose: the real gate is the confirmation the address receives
// mail, which is out of scope.
fn is_plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_is_normalized() {
        let user = User::new("  Alice@Example.COM ", "hash".into()).unwrap();
        assert_eq!(user.email, "alice@example.com");
    }

    #[test]
    fn rejects_malformed_emails() {
        for bad in ["", "no-at-sign", "@example.com", "a@nodot", "a@.com"] {
            assert!(User::new(bad, "hash".into()).is_err(), "accepted {bad:?}");
        }
    }
}

use trackle_core::UserId;

/// Authenticated identity for a request, derived from the verified bearer
/// token by the auth middleware.
///
/// This is immutable and must be present for all protected routes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: UserId,
    email: String,
}

impl CurrentUser {
    pub fn new(user_id: UserId, email: String) -> Self {
        Self { user_id, email }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

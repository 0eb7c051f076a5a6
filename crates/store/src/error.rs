use thiserror::Error;

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage-layer error.
///
/// Deterministic outcomes the services branch on (`Conflict`, `NotFound`)
/// are separated from backend failures, which the API boundary logs and
/// surfaces as a generic internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Unique-constraint violation (e.g. duplicate email, duplicate
    /// membership row).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The row to update or delete does not exist.
    #[error("not found")]
    NotFound,

    /// Unexpected backend failure (connectivity, corrupt row, ...).
    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                StoreError::Conflict(db.message().to_string())
            }
            _ => StoreError::Backend(err.to_string()),
        }
    }
}

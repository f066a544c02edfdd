use common::{PvzId, ReceptionId};
use thiserror::Error;

/// Errors that can occur when interacting with the store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The pickup point does not exist.
    #[error("Pickup point not found: {0}")]
    PvzNotFound(PvzId),

    /// The reception does not exist.
    #[error("Reception not found: {0}")]
    ReceptionNotFound(ReceptionId),

    /// Another reception is still open for this pickup point.
    #[error("Pickup point {0} already has an open reception")]
    OpenReceptionExists(PvzId),

    /// The reception was closed before the product mutation took effect.
    #[error("Reception {0} is closed")]
    ReceptionClosed(ReceptionId),

    /// The backend rejected a row (check or not-null constraint).
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// A stored value could not be mapped back to the model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl StorageError {
    /// Returns true for failures worth retrying by the caller: the pool ran
    /// dry, the connection dropped, or the pool is shutting down.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StorageError::Database(
                sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_)
            )
        )
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StorageError>;

//! Domain error types.

use common::{PvzId, ReceptionId, Role};
use storage::StorageError;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// The caller's role may not perform the action.
    #[error("Forbidden: only {required} may {action}")]
    Forbidden {
        action: &'static str,
        required: Role,
    },

    /// The pickup point does not exist.
    #[error("Pickup point not found: {0}")]
    PvzNotFound(PvzId),

    /// The reception does not exist.
    #[error("Reception not found: {0}")]
    ReceptionNotFound(ReceptionId),

    /// Close was requested but nothing is open.
    #[error("Pickup point {0} has no open reception to close")]
    NoReceptionToClose(PvzId),

    /// The open reception has no products left.
    #[error("Reception {0} has no products to remove")]
    NothingToRemove(ReceptionId),

    /// A reception is already open for the pickup point.
    #[error("Pickup point {0} already has an open reception")]
    ReceptionAlreadyOpen(PvzId),

    /// A product operation found no open reception.
    #[error("Pickup point {0} has no active reception")]
    NoActiveReception(PvzId),

    /// The city is not on the allow-list.
    #[error("City is not available for registration: {0}")]
    CityNotAllowed(String),

    /// An error occurred in the store.
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

/// Coarse classification of a [`DomainError`].
///
/// Each kind has a stable code callers can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Forbidden,
    NotFound,
    Conflict,
    NoActiveReception,
    CityNotAllowed,
    ConstraintViolation,
    /// Retry may succeed (pool exhausted, connection lost).
    Transient,
    Internal,
}

impl ErrorKind {
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::NoActiveReception => "no_active_reception",
            ErrorKind::CityNotAllowed => "city_not_allowed",
            ErrorKind::ConstraintViolation => "constraint_violation",
            ErrorKind::Transient => "unavailable",
            ErrorKind::Internal => "internal",
        }
    }
}

impl DomainError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Forbidden { .. } => ErrorKind::Forbidden,
            DomainError::PvzNotFound(_)
            | DomainError::ReceptionNotFound(_)
            | DomainError::NoReceptionToClose(_)
            | DomainError::NothingToRemove(_) => ErrorKind::NotFound,
            DomainError::ReceptionAlreadyOpen(_) => ErrorKind::Conflict,
            DomainError::NoActiveReception(_) => ErrorKind::NoActiveReception,
            DomainError::CityNotAllowed(_) => ErrorKind::CityNotAllowed,
            DomainError::Storage(StorageError::ConstraintViolation(_)) => {
                ErrorKind::ConstraintViolation
            }
            DomainError::Storage(e) if e.is_transient() => ErrorKind::Transient,
            DomainError::Storage(_) => ErrorKind::Internal,
        }
    }
}

impl From<StorageError> for DomainError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::PvzNotFound(id) => DomainError::PvzNotFound(id),
            StorageError::ReceptionNotFound(id) => DomainError::ReceptionNotFound(id),
            StorageError::OpenReceptionExists(id) => DomainError::ReceptionAlreadyOpen(id),
            other => DomainError::Storage(other),
        }
    }
}

/// Records a rejected operation and hands the error back.
pub(crate) fn rejected(err: DomainError) -> DomainError {
    let kind = err.kind();
    metrics::counter!("domain_rejections_total", "reason" => kind.code()).increment(1);
    match kind {
        ErrorKind::Transient | ErrorKind::Internal => {
            tracing::error!(error = %err, code = kind.code(), "operation failed")
        }
        _ => tracing::warn!(error = %err, code = kind.code(), "operation rejected"),
    }
    err
}

/// Fails with `Forbidden` unless `role` is `required`.
pub(crate) fn ensure_role(
    role: Role,
    required: Role,
    action: &'static str,
) -> Result<(), DomainError> {
    if role == required {
        Ok(())
    } else {
        Err(rejected(DomainError::Forbidden { action, required }))
    }
}

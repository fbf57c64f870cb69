/// Service error taxonomy
///
/// Services fail fast with the most specific kind available and leave the
/// translation to transport-level responses to the caller (the HTTP
/// boundary maps each kind to a status code).
///
/// | Kind | Meaning |
/// |---|---|
/// | `InvalidArgument` | required input missing or blank |
/// | `Validation` | one or more field-level rule violations |
/// | `NotFound` | entity absent, or not owned by the caller |
/// | `Conflict` | uniqueness violation (pre-check or unique index) |
/// | `Unauthorized` | missing or invalid identity |
/// | `Storage` | any other datastore failure |

use crate::auth::password::PasswordError;
use crate::db::store::StoreError;
use crate::validation::FieldViolation;

/// Result alias used by all services
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Error returned by the user and task services
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Required input was missing or blank
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Request failed field-level validation
    #[error("Validation failed: {} violation(s)", .0.len())]
    Validation(Vec<FieldViolation>),

    /// Entity does not exist or is not owned by the caller
    #[error("Not found: {0}")]
    NotFound(String),

    /// Uniqueness violation
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Identity could not be established
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Stored credential could not be processed
    #[error("Credential error: {0}")]
    Credential(PasswordError),

    /// Datastore failure
    #[error("Storage error: {0}")]
    Storage(StoreError),
}

impl ServiceError {
    /// Shorthand for an `InvalidArgument` error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        ServiceError::InvalidArgument(msg.into())
    }

    /// Shorthand for a `NotFound` error
    pub fn not_found(msg: impl Into<String>) -> Self {
        ServiceError::NotFound(msg.into())
    }
}

/// Unique-index conflicts raised at commit time are the authoritative
/// uniqueness guard, so they surface as `Conflict` rather than `Storage`.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(constraint) => {
                ServiceError::Conflict(format!("Unique constraint violated: {}", constraint))
            }
            other => ServiceError::Storage(other),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::EmptyPassword => {
                ServiceError::InvalidArgument("Password must not be empty".to_string())
            }
            other => ServiceError::Credential(other),
        }
    }
}

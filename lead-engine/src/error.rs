//! Engine error taxonomy.
//!
//! Errors are typed results, not control-flow exceptions. Validation
//! problems are batched and user-correctable; authorization failures are
//! always distinct from empty results; conflicts surface only after the
//! internal retry; store faults are the one genuinely exceptional case.

use funnel::ValidationError;
use orgauth::AuthzError;

use crate::store::StoreError;

/// Error types for the lifecycle engine.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    /// One error per problem, batched so a caller can display all at once
    #[error("validation failed with {} problem(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Forbidden by capability or scope
    #[error(transparent)]
    Authorization(#[from] AuthzError),

    /// A concurrent write won; retried once internally before surfacing
    #[error("concurrent update: expected version {expected}, found {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// Entity does not exist
    #[error("'{0}' not found")]
    NotFound(String),

    /// Role construction/mutation problem
    #[error(transparent)]
    Role(#[from] orgauth::RoleError),

    /// Store unreachable or otherwise faulted
    #[error("store failure: {0}")]
    Store(String),
}

impl From<StoreError> for EngineError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::VersionConflict { expected, actual } => Self::Conflict { expected, actual },
            StoreError::Unavailable(msg) => Self::Store(msg),
        }
    }
}

/// Result alias for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

use crate::feed::error::FeedError;
use crate::repository::error::DatabaseError;

/// Service-layer failures.
///
/// Validation variants carry the exact text shown to the invoking user.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ServiceError {
    #[error("{message}")]
    AlreadyExists { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    NotOwner { message: String },

    #[error("{message}")]
    Invalid { message: String },

    #[error("FeedError: {0}")]
    FeedError(#[from] FeedError),

    #[error("DatabaseError: {0}")]
    DatabaseError(#[from] DatabaseError),
}

impl ServiceError {
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::AlreadyExists {
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn not_owner(message: impl Into<String>) -> Self {
        Self::NotOwner {
            message: message.into(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Whether this is a user mistake rather than a system failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::AlreadyExists { .. }
                | Self::NotFound { .. }
                | Self::NotOwner { .. }
                | Self::Invalid { .. }
        )
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(e: sqlx::Error) -> Self {
        Self::DatabaseError(DatabaseError::BackendError(e))
    }
}

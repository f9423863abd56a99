use domain::{RepositoryError, UnknownOrderStatus};
use thiserror::Error;

/// Errors that can occur in the PostgreSQL store.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A stored row holds a value the domain cannot represent.
    #[error("Invalid stored value in {column}: {value}")]
    InvalidValue { column: &'static str, value: String },
}

impl From<UnknownOrderStatus> for PersistenceError {
    fn from(err: UnknownOrderStatus) -> Self {
        PersistenceError::InvalidValue {
            column: "orders.status",
            value: err.0,
        }
    }
}

impl From<PersistenceError> for RepositoryError {
    fn from(err: PersistenceError) -> Self {
        RepositoryError::Backend(Box::new(err))
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, PersistenceError>;

//! Storage error types.

use ovr_core::WorkflowError;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested row was not found.
    #[error("Record not found: {table}/{id}")]
    NotFound {
        /// Table or entity kind.
        table: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// A uniqueness constraint was violated.
    #[error("Record already exists: {table}/{key}")]
    AlreadyExists {
        /// Table or entity kind.
        table: String,
        /// The conflicting key.
        key: String,
    },

    /// The backend failed.
    #[error("Internal storage error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl StorageError {
    /// Creates a new `NotFound` error.
    #[must_use]
    pub fn not_found(table: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            table: table.into(),
            id: id.to_string(),
        }
    }

    /// Creates a new `AlreadyExists` error.
    #[must_use]
    pub fn already_exists(table: impl Into<String>, key: impl Into<String>) -> Self {
        Self::AlreadyExists {
            table: table.into(),
            key: key.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is a uniqueness violation.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

impl From<StorageError> for WorkflowError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound { table, id } => WorkflowError::not_found(table, id),
            StorageError::AlreadyExists { table, key } => {
                WorkflowError::validation(format!("{table} {key} already exists"))
            }
            StorageError::Internal { message } => WorkflowError::storage(message),
        }
    }
}

/// Type alias for storage results.
pub type StorageResult<T> = Result<T, StorageError>;

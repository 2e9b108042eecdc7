//! Workflow error types.
//!
//! Callers only ever see three kinds of failure: validation, not found and
//! authorization. Storage and internal failures exist for collaborator
//! problems and are reported as server errors at the edge.

use std::fmt;

/// Errors surfaced by the workflow engine and its access-control layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    /// The payload shape or a domain rule was violated.
    #[error("Validation error{}: {message}", .path.as_deref().map(|p| format!(" at {p}")).unwrap_or_default())]
    Validation {
        /// Field path of the offending value (e.g. `data.findings`).
        path: Option<String>,
        /// Description of the violation.
        message: String,
    },

    /// The entity does not exist, or the principal may not see it.
    #[error("{resource} {id} not found")]
    NotFound {
        /// Kind of entity that was looked up.
        resource: String,
        /// Identifier that was looked up.
        id: String,
    },

    /// The entity is visible but the action is not allowed.
    #[error("Not authorized: {message}")]
    Authorization {
        /// Human-readable reason naming the missing precondition.
        message: String,
    },

    /// The storage collaborator failed.
    #[error("Storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
    },

    /// An unexpected internal error occurred.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl WorkflowError {
    /// Creates a `Validation` error without a field path.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            path: None,
            message: message.into(),
        }
    }

    /// Creates a `Validation` error attributed to a field path.
    #[must_use]
    pub fn invalid_field(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            path: Some(path.into()),
            message: message.into(),
        }
    }

    /// Creates a `NotFound` error.
    #[must_use]
    pub fn not_found(resource: impl Into<String>, id: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.to_string(),
        }
    }

    /// Creates an `Authorization` error.
    #[must_use]
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            message: message.into(),
        }
    }

    /// Creates a `Storage` error.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns `true` if this is a not found error.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` if this is an authorization error.
    #[must_use]
    pub fn is_authorization(&self) -> bool {
        matches!(self, Self::Authorization { .. })
    }

    /// Returns the field path for validation errors.
    #[must_use]
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Validation { path, .. } => path.as_deref(),
            _ => None,
        }
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } => ErrorCategory::Validation,
            Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::Authorization { .. } => ErrorCategory::Authorization,
            Self::Storage { .. } => ErrorCategory::Infrastructure,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of workflow errors for logging and response mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Payload or domain-rule violations.
    Validation,
    /// Missing or invisible entities.
    NotFound,
    /// Status or role preconditions not met.
    Authorization,
    /// Storage collaborator failures.
    Infrastructure,
    /// Internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Authorization => write!(f, "authorization"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Internal => write!(f, "internal"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_display_includes_path() {
        let err = WorkflowError::invalid_field("data.findings", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Validation error at data.findings: must not be empty"
        );
        assert_eq!(err.path(), Some("data.findings"));

        let err = WorkflowError::validation("duplicate");
        assert_eq!(err.to_string(), "Validation error: duplicate");
        assert_eq!(err.path(), None);
    }

    #[test]
    fn categories() {
        assert_eq!(
            WorkflowError::not_found("Incident", 4).category(),
            ErrorCategory::NotFound
        );
        assert_eq!(
            WorkflowError::authorization("x").category(),
            ErrorCategory::Authorization
        );
        assert_eq!(
            WorkflowError::storage("x").category(),
            ErrorCategory::Infrastructure
        );
        assert_eq!(ErrorCategory::NotFound.to_string(), "not_found");
    }

    #[test]
    fn not_found_message() {
        let err = WorkflowError::not_found("Incident", 42);
        assert_eq!(err.to_string(), "Incident 42 not found");
        assert!(err.is_not_found());
    }
}

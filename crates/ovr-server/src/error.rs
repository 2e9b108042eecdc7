//! HTTP error responses.
//!
//! Every failure is rendered as `{ "error": kind, "message": .., "path"?: .. }`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use ovr_core::{ErrorCategory, WorkflowError};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// No principal could be extracted from the request.
    #[error("Authentication required: {message}")]
    Unauthenticated { message: String },
}

impl ApiError {
    pub fn unauthenticated(message: impl Into<String>) -> Self {
        Self::Unauthenticated {
            message: message.into(),
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated { .. } => StatusCode::UNAUTHORIZED,
            Self::Workflow(err) => match err.category() {
                ErrorCategory::Validation => StatusCode::BAD_REQUEST,
                ErrorCategory::NotFound => StatusCode::NOT_FOUND,
                ErrorCategory::Authorization => StatusCode::FORBIDDEN,
                ErrorCategory::Infrastructure | ErrorCategory::Internal => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated { .. } => "unauthenticated",
            Self::Workflow(err) => match err.category() {
                ErrorCategory::Validation => "validation",
                ErrorCategory::NotFound => "not_found",
                ErrorCategory::Authorization => "authorization",
                ErrorCategory::Infrastructure | ErrorCategory::Internal => "internal",
            },
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<&'a str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let (message, path) = match &self {
            // Collaborator failures are not echoed to callers.
            _ if status.is_server_error() => ("Internal server error".to_string(), None),
            Self::Workflow(WorkflowError::Validation { path, message }) => {
                (message.clone(), path.as_deref())
            }
            Self::Workflow(err) => (err.to_string(), None),
            Self::Unauthenticated { message } => (message.clone(), None),
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
            path,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        WorkflowError::invalid_field("body", rejection.body_text()).into()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        WorkflowError::invalid_field("query", rejection.body_text()).into()
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        WorkflowError::invalid_field("path", rejection.body_text()).into()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

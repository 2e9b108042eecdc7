//! Request principal extraction.
//!
//! Authentication happens upstream. A trusted gateway forwards the user as
//! `x-user-id`, `x-user-roles` (comma separated) and `x-user-email`. External
//! collaborators instead present their invitation token as `?token=`.

use axum::{
    extract::{FromRequestParts, Query},
    http::{HeaderMap, request::Parts},
};
use ovr_core::{Principal, ResourceRef, SharedPrincipal, UserPrincipal, WorkflowError};
use serde::Deserialize;

use crate::error::{ApiError, ApiResult};

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_ROLES_HEADER: &str = "x-user-roles";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// The authenticated caller of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    User(UserPrincipal),
    /// A shared-access token, not yet tied to a resource.
    Token(String),
}

impl Caller {
    /// Resolves the caller against the resource named by the route.
    pub fn for_resource(self, resource: ResourceRef) -> Principal {
        match self {
            Self::User(user) => Principal::User(user),
            Self::Token(token) => Principal::Shared(SharedPrincipal { resource, token }),
        }
    }

    /// Requires an employee. Token holders get `403` naming the operation.
    pub fn into_user(self, operation: &str) -> ApiResult<UserPrincipal> {
        match self {
            Self::User(user) => Ok(user),
            Self::Token(_) => Err(WorkflowError::authorization(format!(
                "Shared-access collaborators cannot {operation}"
            ))
            .into()),
        }
    }
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = user_from_headers(&parts.headers)? {
            return Ok(Self::User(user));
        }

        let token = Query::<TokenQuery>::try_from_uri(&parts.uri)
            .ok()
            .and_then(|Query(query)| query.token)
            .filter(|token| !token.is_empty());
        match token {
            Some(token) => Ok(Self::Token(token)),
            None => Err(ApiError::unauthenticated(
                "Missing x-user-id header or token parameter",
            )),
        }
    }
}

/// Reads the gateway user headers. Returns `None` when `x-user-id` is absent.
pub fn user_from_headers(headers: &HeaderMap) -> ApiResult<Option<UserPrincipal>> {
    let Some(raw_id) = headers.get(USER_ID_HEADER) else {
        return Ok(None);
    };
    let id = raw_id
        .to_str()
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::unauthenticated("x-user-id must be a positive integer"))?;

    let roles = headers
        .get(USER_ROLES_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    let mut user = UserPrincipal::from_role_names(
        id,
        roles.split(',').map(str::trim).filter(|name| !name.is_empty()),
    );
    if let Some(email) = headers
        .get(USER_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|email| !email.trim().is_empty())
    {
        user = user.with_email(email.trim());
    }
    Ok(Some(user))
}

//! Roles and request principals.
//!
//! Principals are supplied by the external authentication layer. A
//! principal is either an authenticated employee (id plus roles) or an
//! anonymous caller presenting a shared-access token for one resource.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::UserId;
use crate::invitation::ResourceRef;
use crate::status::UnknownName;

// =============================================================================
// Role
// =============================================================================

/// Hospital roles recognised by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Employee,
    Supervisor,
    TeamLead,
    DepartmentHead,
    QualityManager,
    QualityAnalyst,
    Executive,
    Admin,
    Developer,
}

impl Role {
    /// Every role.
    pub const ALL: [Role; 9] = [
        Self::Employee,
        Self::Supervisor,
        Self::TeamLead,
        Self::DepartmentHead,
        Self::QualityManager,
        Self::QualityAnalyst,
        Self::Executive,
        Self::Admin,
        Self::Developer,
    ];

    /// Returns the wire name of the role.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Employee => "employee",
            Self::Supervisor => "supervisor",
            Self::TeamLead => "team_lead",
            Self::DepartmentHead => "department_head",
            Self::QualityManager => "quality_manager",
            Self::QualityAnalyst => "quality_analyst",
            Self::Executive => "executive",
            Self::Admin => "admin",
            Self::Developer => "developer",
        }
    }

    /// Roles that see every non-draft incident.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        matches!(
            self,
            Self::QualityManager
                | Self::QualityAnalyst
                | Self::Executive
                | Self::Admin
                | Self::Developer
        )
    }

    /// Roles that additionally see incidents they supervise.
    #[must_use]
    pub fn is_supervisory(&self) -> bool {
        matches!(self, Self::Supervisor | Self::TeamLead)
    }

    /// Quality Improvement department roles.
    #[must_use]
    pub fn is_quality(&self) -> bool {
        matches!(self, Self::QualityManager | Self::QualityAnalyst)
    }

    /// Roles allowed to act in place of the department head of record.
    #[must_use]
    pub fn is_override(&self) -> bool {
        matches!(self, Self::Admin | Self::Developer)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == normalized)
            .ok_or_else(|| UnknownName::new("role", s))
    }
}

// =============================================================================
// Principals
// =============================================================================

/// An authenticated employee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPrincipal {
    /// User id from the authentication system.
    pub id: UserId,

    /// Email address, used to match email-bound invitations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Assigned roles.
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl UserPrincipal {
    /// Creates a principal with the given roles and no email.
    #[must_use]
    pub fn new(id: UserId, roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            id,
            email: None,
            roles: roles.into_iter().collect(),
        }
    }

    /// Sets the email address.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Builds a principal from role names as delivered by the identity
    /// provider. Unrecognised names are dropped.
    #[must_use]
    pub fn from_role_names<I, S>(id: UserId, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut roles = Vec::new();
        for name in names {
            let name = name.as_ref();
            match name.parse::<Role>() {
                Ok(role) if !roles.contains(&role) => roles.push(role),
                Ok(_) => {}
                Err(_) => tracing::debug!(user_id = id, role = %name, "Ignoring unknown role"),
            }
        }
        Self {
            id,
            email: None,
            roles,
        }
    }

    /// Returns `true` if the user has a specific role.
    #[must_use]
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Returns `true` if the user has any of the specified roles.
    #[must_use]
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|role| self.has_role(*role))
    }

    /// Returns `true` if any role is elevated.
    #[must_use]
    pub fn is_elevated(&self) -> bool {
        self.roles.iter().any(Role::is_elevated)
    }

    /// Returns `true` if any role is supervisory.
    #[must_use]
    pub fn is_supervisory(&self) -> bool {
        self.roles.iter().any(Role::is_supervisory)
    }

    /// Returns `true` if any role belongs to the QI department.
    #[must_use]
    pub fn is_quality(&self) -> bool {
        self.roles.iter().any(Role::is_quality)
    }

    /// Returns `true` if any role is a workflow override role.
    #[must_use]
    pub fn is_override(&self) -> bool {
        self.roles.iter().any(Role::is_override)
    }

    /// Case-insensitive match against the principal's email.
    #[must_use]
    pub fn email_matches(&self, other: &str) -> bool {
        self.email
            .as_deref()
            .is_some_and(|email| email.trim().eq_ignore_ascii_case(other.trim()))
    }
}

/// An anonymous collaborator holding a shared-access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedPrincipal {
    /// The resource the token claims access to.
    pub resource: ResourceRef,
    /// The opaque token as presented.
    pub token: String,
}

/// The actor issuing a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Principal {
    /// Authenticated employee.
    User(UserPrincipal),
    /// Token-authenticated external collaborator.
    Shared(SharedPrincipal),
}

impl Principal {
    /// Returns the user principal, if any.
    #[must_use]
    pub fn as_user(&self) -> Option<&UserPrincipal> {
        match self {
            Self::User(user) => Some(user),
            Self::Shared(_) => None,
        }
    }
}

impl From<UserPrincipal> for Principal {
    fn from(user: UserPrincipal) -> Self {
        Self::User(user)
    }
}

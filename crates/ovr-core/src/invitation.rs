//! Shared-access invitation records.
//!
//! An invitation grants one external collaborator access to exactly one
//! investigation or corrective action. All state lives in the record; the
//! token itself is opaque.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::UserId;

/// Kinds of resource that can be shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedResourceKind {
    Investigation,
    CorrectiveAction,
}

impl SharedResourceKind {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Investigation => "investigation",
            Self::CorrectiveAction => "corrective_action",
        }
    }

    /// The role label granted to collaborators on this kind of resource.
    #[must_use]
    pub fn invitation_role(&self) -> InvitationRole {
        match self {
            Self::Investigation => InvitationRole::Investigator,
            Self::CorrectiveAction => InvitationRole::ActionHandler,
        }
    }
}

impl fmt::Display for SharedResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `(resourceType, resourceId)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceRef {
    #[serde(rename = "resourceType")]
    pub kind: SharedResourceKind,
    #[serde(rename = "resourceId")]
    pub id: i64,
}

impl ResourceRef {
    #[must_use]
    pub fn investigation(id: i64) -> Self {
        Self {
            kind: SharedResourceKind::Investigation,
            id,
        }
    }

    #[must_use]
    pub fn corrective_action(id: i64) -> Self {
        Self {
            kind: SharedResourceKind::CorrectiveAction,
            id,
        }
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.id)
    }
}

/// Role label shown for an invited collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationRole {
    Investigator,
    ActionHandler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Revoked,
}

impl InvitationStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Revoked => "revoked",
        }
    }
}

impl fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted shared-access invitation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedAccessInvitation {
    pub id: Uuid,
    #[serde(flatten)]
    pub resource: ResourceRef,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    pub role: InvitationRole,
    pub token: String,
    pub status: InvitationStatus,
    pub invited_by: UserId,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub expires_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_accessed_at: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub accepted_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl SharedAccessInvitation {
    /// Returns `true` if the invitation has an expiry at or before `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Returns `true` if the invitation still grants or may grant access:
    /// not revoked and not expired.
    #[must_use]
    pub fn is_live_at(&self, now: OffsetDateTime) -> bool {
        self.status != InvitationStatus::Revoked && !self.is_expired_at(now)
    }
}

/// An invitation that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    pub resource: ResourceRef,
    pub email: String,
    pub token: String,
    pub invited_by: UserId,
    pub expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl NewInvitation {
    /// Materialises the invitation in `pending` status.
    #[must_use]
    pub fn into_invitation(self, id: Uuid) -> SharedAccessInvitation {
        SharedAccessInvitation {
            id,
            resource: self.resource,
            email: self.email,
            user_id: None,
            role: self.resource.kind.invitation_role(),
            token: self.token,
            status: InvitationStatus::Pending,
            invited_by: self.invited_by,
            expires_at: self.expires_at,
            last_accessed_at: None,
            accepted_at: None,
            created_at: self.created_at,
        }
    }
}

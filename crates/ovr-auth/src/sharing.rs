//! Shared-access invitations.
//!
//! The [`SharedAccessManager`] owns the invitation lifecycle
//! (create, accept, revoke) and answers the single question asked by every
//! investigation and corrective-action endpoint: may this principal touch
//! this resource?
//!
//! Access is granted to employees through a working relationship with the
//! resource or an invitation bound to them, and to anonymous collaborators
//! through a valid token for exactly that resource.

use std::sync::{Arc, LazyLock};

use ovr_core::{
    Incident, IncidentId, InvitationStatus, NewInvitation, Principal, ResourceRef,
    SharedAccessInvitation, SharedResourceKind, UserId, UserPrincipal, WorkflowError,
    WorkflowResult,
};
use ovr_storage::WorkflowStorage;
use regex::Regex;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::SharingConfig;
use crate::token::{self, TokenRejection};
use crate::visibility::{corrective_action_relationship, investigation_relationship};

static EMAIL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid email regex")
});

/// Message returned for every token failure. The reason is only logged.
const INVALID_TOKEN_MESSAGE: &str = "Invalid or expired access token";

/// Requested lifetime of a new invitation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvitationExpiry {
    /// The configured default lifetime.
    #[default]
    Default,
    /// No expiry.
    Never,
    /// A fixed instant, which must be in the future.
    At(OffsetDateTime),
}

/// The outcome of a successful access check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessGrant {
    pub resource: ResourceRef,
    /// Invitation that granted access, if any.
    pub invitation_id: Option<Uuid>,
    /// The user recorded as acting. For anonymous token holders this is the
    /// bound user, or the inviter when the invitation is unbound.
    pub acting_user: UserId,
}

impl AccessGrant {
    fn relationship(resource: ResourceRef, user: UserId) -> Self {
        Self {
            resource,
            invitation_id: None,
            acting_user: user,
        }
    }

    fn invitation(invitation: &SharedAccessInvitation) -> Self {
        Self {
            resource: invitation.resource,
            invitation_id: Some(invitation.id),
            acting_user: invitation.user_id.unwrap_or(invitation.invited_by),
        }
    }
}

/// Invitation lifecycle and resource access checks.
#[derive(Clone)]
pub struct SharedAccessManager {
    storage: Arc<dyn WorkflowStorage>,
    config: SharingConfig,
}

impl SharedAccessManager {
    pub fn new(storage: Arc<dyn WorkflowStorage>, config: SharingConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &SharingConfig {
        &self.config
    }

    // ==================== Lifecycle ====================

    /// Invites `email` to collaborate on `resource`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the inviter cannot access the resource
    /// - `Validation` for a malformed email, an expiry in the past, a
    ///   disallowed never-expiring invitation, or a live invitation for the
    ///   same email and resource
    pub async fn create_invitation(
        &self,
        inviter: &UserPrincipal,
        resource: ResourceRef,
        email: &str,
        expiry: InvitationExpiry,
    ) -> WorkflowResult<SharedAccessInvitation> {
        self.check_user_access(inviter, resource).await?;

        let email = email.trim();
        if !EMAIL_REGEX.is_match(email) {
            return Err(WorkflowError::invalid_field(
                "email",
                "must be a valid email address",
            ));
        }

        let now = OffsetDateTime::now_utc();
        let expires_at = match expiry {
            InvitationExpiry::Default => Some(now + self.config.default_lifetime()),
            InvitationExpiry::Never if self.config.allow_never_expiring => None,
            InvitationExpiry::Never => {
                return Err(WorkflowError::invalid_field(
                    "expiresAt",
                    "never-expiring invitations are disabled",
                ));
            }
            InvitationExpiry::At(at) if at > now => Some(at),
            InvitationExpiry::At(_) => {
                return Err(WorkflowError::invalid_field(
                    "expiresAt",
                    "must be in the future",
                ));
            }
        };

        let existing = self.storage.list_invitations(resource).await?;
        if existing
            .iter()
            .any(|inv| inv.email.eq_ignore_ascii_case(email) && inv.is_live_at(now))
        {
            return Err(WorkflowError::invalid_field(
                "email",
                format!("an active invitation for this address already exists on {resource}"),
            ));
        }

        let invitation = self
            .storage
            .create_invitation(NewInvitation {
                resource,
                email: email.to_string(),
                token: token::generate_token(self.config.token_bytes),
                invited_by: inviter.id,
                expires_at,
                created_at: now,
            })
            .await?;

        tracing::info!(
            invitation_id = %invitation.id,
            resource = %resource,
            invited_by = inviter.id,
            "Created shared-access invitation"
        );
        Ok(invitation)
    }

    /// Accepts the invitation holding `token`, binding it to `user` when
    /// given.
    ///
    /// Accepting an already accepted invitation returns it unchanged.
    pub async fn accept_invitation(
        &self,
        token: &str,
        user: Option<&UserPrincipal>,
    ) -> WorkflowResult<SharedAccessInvitation> {
        let Some(mut invitation) = self.find_by_token(token).await? else {
            return Err(WorkflowError::not_found("Invitation", "for token"));
        };

        let now = OffsetDateTime::now_utc();
        match invitation.status {
            InvitationStatus::Revoked => {
                return Err(WorkflowError::validation("Invitation has been revoked"));
            }
            _ if invitation.is_expired_at(now) => {
                return Err(WorkflowError::validation("Invitation has expired"));
            }
            InvitationStatus::Accepted => return Ok(invitation),
            InvitationStatus::Pending => {}
        }

        invitation.status = InvitationStatus::Accepted;
        invitation.accepted_at = Some(now);
        if let Some(user) = user {
            invitation.user_id = Some(user.id);
        }
        let invitation = self.storage.update_invitation(invitation).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            resource = %invitation.resource,
            user_id = ?invitation.user_id,
            "Accepted shared-access invitation"
        );
        Ok(invitation)
    }

    /// Revokes an invitation. Only the inviter or an elevated user may do so.
    ///
    /// Revoking twice is a no-op.
    pub async fn revoke_invitation(
        &self,
        actor: &UserPrincipal,
        id: Uuid,
    ) -> WorkflowResult<SharedAccessInvitation> {
        let mut invitation = self
            .storage
            .get_invitation(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Invitation", id))?;

        if invitation.invited_by != actor.id && !actor.is_elevated() {
            return Err(WorkflowError::authorization(
                "Only the inviter or QI staff can revoke an invitation",
            ));
        }
        if invitation.status == InvitationStatus::Revoked {
            return Ok(invitation);
        }

        invitation.status = InvitationStatus::Revoked;
        let invitation = self.storage.update_invitation(invitation).await?;

        tracing::info!(
            invitation_id = %invitation.id,
            resource = %invitation.resource,
            revoked_by = actor.id,
            "Revoked shared-access invitation"
        );
        Ok(invitation)
    }

    /// Lists the invitations of a resource. Requires an employee with access.
    pub async fn list_invitations(
        &self,
        actor: &Principal,
        resource: ResourceRef,
    ) -> WorkflowResult<Vec<SharedAccessInvitation>> {
        let Some(user) = actor.as_user() else {
            return Err(WorkflowError::authorization(
                "Shared-access collaborators cannot list invitations",
            ));
        };
        self.check_user_access(user, resource).await?;
        Ok(self.storage.list_invitations(resource).await?)
    }

    // ==================== Access ====================

    /// Validates a token presented for `resource`.
    ///
    /// The token is compared in constant time against every invitation of
    /// the resource. Every failure is reported with the same generic
    /// message; the reason is logged at debug level.
    pub async fn validate_token(
        &self,
        resource: ResourceRef,
        token: &str,
    ) -> WorkflowResult<SharedAccessInvitation> {
        let now = OffsetDateTime::now_utc();
        let invitations = if token.is_empty() {
            Vec::new()
        } else {
            self.storage.list_invitations(resource).await?
        };
        let matched = invitations.into_iter().fold(None, |found, invitation| {
            if token::tokens_match(&invitation.token, token) {
                Some(invitation)
            } else {
                found
            }
        });

        let outcome = match &matched {
            None => Err(TokenRejection::Mismatch),
            Some(invitation) => token::check_standing(invitation, now),
        };

        match (outcome, matched) {
            (Ok(()), Some(invitation)) => {
                self.touch(&invitation, now).await;
                Ok(invitation)
            }
            (Err(reason), _) => {
                tracing::debug!(resource = %resource, %reason, "Rejected shared-access token");
                Err(WorkflowError::authorization(INVALID_TOKEN_MESSAGE))
            }
            (Ok(()), None) => Err(WorkflowError::authorization(INVALID_TOKEN_MESSAGE)),
        }
    }

    /// Checks that the principal may access the resource.
    ///
    /// # Errors
    ///
    /// `NotFound` if the resource does not exist, an employee has no access
    /// to it, or a presented token does not open it.
    pub async fn verify_access(
        &self,
        principal: &Principal,
        resource: ResourceRef,
    ) -> WorkflowResult<AccessGrant> {
        match principal {
            Principal::User(user) => self.check_user_access(user, resource).await,
            Principal::Shared(shared) => {
                self.resource_incident(resource).await?;
                let invitation = self
                    .validate_token(resource, &shared.token)
                    .await
                    .map_err(|err| {
                        if err.is_authorization() {
                            not_found(resource)
                        } else {
                            err
                        }
                    })?;
                Ok(AccessGrant::invitation(&invitation))
            }
        }
    }

    async fn check_user_access(
        &self,
        user: &UserPrincipal,
        resource: ResourceRef,
    ) -> WorkflowResult<AccessGrant> {
        let incident = self.resource_incident(resource).await?;
        if self.has_relationship(user, resource, &incident).await? {
            return Ok(AccessGrant::relationship(resource, user.id));
        }

        let now = OffsetDateTime::now_utc();
        let invitations = self.storage.list_invitations(resource).await?;
        match invitations
            .iter()
            .find(|inv| token::is_bound_to(inv, user, now))
        {
            Some(invitation) => {
                self.touch(invitation, now).await;
                Ok(AccessGrant {
                    acting_user: user.id,
                    ..AccessGrant::invitation(invitation)
                })
            }
            None => {
                tracing::debug!(
                    user_id = user.id,
                    resource = %resource,
                    "No access to shared resource"
                );
                Err(not_found(resource))
            }
        }
    }

    async fn has_relationship(
        &self,
        user: &UserPrincipal,
        resource: ResourceRef,
        incident: &Incident,
    ) -> WorkflowResult<bool> {
        match resource.kind {
            SharedResourceKind::Investigation => {
                let investigation = self
                    .storage
                    .get_investigation(resource.id)
                    .await?
                    .ok_or_else(|| not_found(resource))?;
                let assignments = self.storage.list_assignments(incident.id).await?;
                Ok(investigation_relationship(
                    user,
                    &investigation,
                    incident,
                    &assignments,
                ))
            }
            SharedResourceKind::CorrectiveAction => {
                let action = self
                    .storage
                    .get_corrective_action(resource.id)
                    .await?
                    .ok_or_else(|| not_found(resource))?;
                Ok(corrective_action_relationship(user, &action, incident))
            }
        }
    }

    /// Loads the incident behind a shared resource.
    async fn resource_incident(&self, resource: ResourceRef) -> WorkflowResult<Incident> {
        let incident_id: IncidentId = match resource.kind {
            SharedResourceKind::Investigation => {
                self.storage
                    .get_investigation(resource.id)
                    .await?
                    .ok_or_else(|| not_found(resource))?
                    .incident_id
            }
            SharedResourceKind::CorrectiveAction => {
                self.storage
                    .get_corrective_action(resource.id)
                    .await?
                    .ok_or_else(|| not_found(resource))?
                    .incident_id
            }
        };
        self.storage
            .get_incident(incident_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Incident", incident_id))
    }

    async fn find_by_token(&self, token: &str) -> WorkflowResult<Option<SharedAccessInvitation>> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.storage.find_invitation_by_token(token).await?)
    }

    /// Best-effort update of `last_accessed_at`.
    async fn touch(&self, invitation: &SharedAccessInvitation, now: OffsetDateTime) {
        if let Err(err) = self.storage.touch_invitation(invitation.id, now).await {
            tracing::warn!(
                invitation_id = %invitation.id,
                error = %err,
                "Failed to record invitation access"
            );
        }
    }
}

fn not_found(resource: ResourceRef) -> WorkflowError {
    let name = match resource.kind {
        SharedResourceKind::Investigation => "Investigation",
        SharedResourceKind::CorrectiveAction => "CorrectiveAction",
    };
    WorkflowError::not_found(name, resource.id)
}

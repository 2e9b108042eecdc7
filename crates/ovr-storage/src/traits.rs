//! Storage traits for the OVR workflow.
//!
//! Implementations must be thread-safe (`Send + Sync`). Reads return
//! `Ok(None)` for missing rows; updates of missing rows fail with
//! [`StorageError::NotFound`](crate::StorageError::NotFound).

use async_trait::async_trait;
use ovr_core::{
    CorrectiveAction, CorrectiveActionId, Incident, IncidentId, Investigation, InvestigationId,
    InvestigatorAssignment, NewCorrectiveAction, NewIncident, NewInvestigation,
    NewInvestigatorAssignment, NewInvitation, ResourceRef, SharedAccessInvitation,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::StorageResult;
use crate::filter::IncidentFilter;

/// Incident rows.
#[async_trait]
pub trait IncidentStorage: Send + Sync {
    /// Stores a new incident and returns it with its assigned id.
    async fn create_incident(&self, incident: NewIncident) -> StorageResult<Incident>;

    /// Reads an incident by id, without any visibility check.
    async fn get_incident(&self, id: IncidentId) -> StorageResult<Option<Incident>>;

    /// Lists incidents matching the filter, newest first.
    async fn list_incidents(&self, filter: &IncidentFilter) -> StorageResult<Vec<Incident>>;

    /// Replaces an incident row.
    async fn update_incident(&self, incident: Incident) -> StorageResult<Incident>;
}

/// Investigator assignment rows.
#[async_trait]
pub trait AssignmentStorage: Send + Sync {
    /// Lists the assignments of one incident in insertion order.
    async fn list_assignments(
        &self,
        incident_id: IncidentId,
    ) -> StorageResult<Vec<InvestigatorAssignment>>;

    /// Inserts a pending assignment.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::AlreadyExists` if the investigator is already
    /// assigned to the incident.
    async fn insert_assignment(
        &self,
        assignment: NewInvestigatorAssignment,
    ) -> StorageResult<InvestigatorAssignment>;

    /// Replaces an assignment row.
    async fn update_assignment(
        &self,
        assignment: InvestigatorAssignment,
    ) -> StorageResult<InvestigatorAssignment>;
}

/// Investigation rows.
#[async_trait]
pub trait InvestigationStorage: Send + Sync {
    async fn create_investigation(
        &self,
        investigation: NewInvestigation,
    ) -> StorageResult<Investigation>;

    async fn get_investigation(&self, id: InvestigationId)
    -> StorageResult<Option<Investigation>>;

    async fn update_investigation(&self, investigation: Investigation)
    -> StorageResult<Investigation>;
}

/// Corrective action rows.
#[async_trait]
pub trait CorrectiveActionStorage: Send + Sync {
    async fn create_corrective_action(
        &self,
        action: NewCorrectiveAction,
    ) -> StorageResult<CorrectiveAction>;

    async fn get_corrective_action(
        &self,
        id: CorrectiveActionId,
    ) -> StorageResult<Option<CorrectiveAction>>;

    async fn update_corrective_action(
        &self,
        action: CorrectiveAction,
    ) -> StorageResult<CorrectiveAction>;
}

/// Shared-access invitation rows.
#[async_trait]
pub trait InvitationStorage: Send + Sync {
    async fn create_invitation(
        &self,
        invitation: NewInvitation,
    ) -> StorageResult<SharedAccessInvitation>;

    async fn get_invitation(&self, id: Uuid) -> StorageResult<Option<SharedAccessInvitation>>;

    /// Looks an invitation up by its token.
    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> StorageResult<Option<SharedAccessInvitation>>;

    /// Lists every invitation for one resource, oldest first.
    async fn list_invitations(
        &self,
        resource: ResourceRef,
    ) -> StorageResult<Vec<SharedAccessInvitation>>;

    async fn update_invitation(
        &self,
        invitation: SharedAccessInvitation,
    ) -> StorageResult<SharedAccessInvitation>;

    /// Records an access time.
    async fn touch_invitation(&self, id: Uuid, at: OffsetDateTime) -> StorageResult<()>;
}

/// Every storage trait the workflow needs.
///
/// Implemented automatically for any type implementing all of them.
pub trait WorkflowStorage:
    IncidentStorage
    + AssignmentStorage
    + InvestigationStorage
    + CorrectiveActionStorage
    + InvitationStorage
{
}

impl<T> WorkflowStorage for T where
    T: IncidentStorage
        + AssignmentStorage
        + InvestigationStorage
        + CorrectiveActionStorage
        + InvitationStorage
{
}

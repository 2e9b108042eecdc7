use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use ovr_core::{
    AssignmentId, CorrectiveAction, CorrectiveActionId, Incident, IncidentId, Investigation,
    InvestigationId, InvestigatorAssignment, NewCorrectiveAction, NewIncident, NewInvestigation,
    NewInvestigatorAssignment, NewInvitation, ResourceRef, SharedAccessInvitation, UserId,
};
use ovr_storage::{
    AssignmentStorage, CorrectiveActionStorage, IncidentFilter, IncidentStorage,
    InvestigationStorage, InvitationStorage, StorageError, StorageResult,
};
use time::OffsetDateTime;
use uuid::Uuid;

/// In-memory backend for every workflow table.
///
/// Rows live in `DashMap`s keyed by id. Ids come from per-table atomic
/// counters starting at 1. The (incident, investigator) pair and invitation
/// tokens carry unique indexes.
#[derive(Debug)]
pub struct InMemoryStore {
    incidents: DashMap<IncidentId, Incident>,
    assignments: DashMap<AssignmentId, InvestigatorAssignment>,
    assignment_index: DashMap<(IncidentId, UserId), AssignmentId>,
    investigations: DashMap<InvestigationId, Investigation>,
    corrective_actions: DashMap<CorrectiveActionId, CorrectiveAction>,
    invitations: DashMap<Uuid, SharedAccessInvitation>,
    token_index: DashMap<String, Uuid>,
    incident_seq: AtomicI64,
    assignment_seq: AtomicI64,
    investigation_seq: AtomicI64,
    corrective_action_seq: AtomicI64,
}

impl InMemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            incidents: DashMap::new(),
            assignments: DashMap::new(),
            assignment_index: DashMap::new(),
            investigations: DashMap::new(),
            corrective_actions: DashMap::new(),
            invitations: DashMap::new(),
            token_index: DashMap::new(),
            incident_seq: AtomicI64::new(1),
            assignment_seq: AtomicI64::new(1),
            investigation_seq: AtomicI64::new(1),
            corrective_action_seq: AtomicI64::new(1),
        }
    }

    fn next(seq: &AtomicI64) -> i64 {
        seq.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of stored incidents.
    pub fn incident_count(&self) -> usize {
        self.incidents.len()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IncidentStorage for InMemoryStore {
    async fn create_incident(&self, incident: NewIncident) -> StorageResult<Incident> {
        let id = Self::next(&self.incident_seq);
        let incident = incident.into_incident(id, OffsetDateTime::now_utc());
        self.incidents.insert(id, incident.clone());
        Ok(incident)
    }

    async fn get_incident(&self, id: IncidentId) -> StorageResult<Option<Incident>> {
        Ok(self.incidents.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_incidents(&self, filter: &IncidentFilter) -> StorageResult<Vec<Incident>> {
        let mut rows: Vec<Incident> = self
            .incidents
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(rows)
    }

    async fn update_incident(&self, incident: Incident) -> StorageResult<Incident> {
        match self.incidents.get_mut(&incident.id) {
            Some(mut entry) => {
                *entry = incident.clone();
                Ok(incident)
            }
            None => Err(StorageError::not_found("Incident", incident.id)),
        }
    }
}

#[async_trait]
impl AssignmentStorage for InMemoryStore {
    async fn list_assignments(
        &self,
        incident_id: IncidentId,
    ) -> StorageResult<Vec<InvestigatorAssignment>> {
        let mut rows: Vec<InvestigatorAssignment> = self
            .assignments
            .iter()
            .filter(|entry| entry.value().incident_id == incident_id)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|row| row.id);
        Ok(rows)
    }

    async fn insert_assignment(
        &self,
        assignment: NewInvestigatorAssignment,
    ) -> StorageResult<InvestigatorAssignment> {
        let key = (assignment.incident_id, assignment.investigator_id);
        match self.assignment_index.entry(key) {
            Entry::Occupied(_) => Err(StorageError::already_exists(
                "InvestigatorAssignment",
                format!("{}/{}", key.0, key.1),
            )),
            Entry::Vacant(slot) => {
                let id = Self::next(&self.assignment_seq);
                let row = assignment.into_assignment(id);
                self.assignments.insert(id, row.clone());
                slot.insert(id);
                Ok(row)
            }
        }
    }

    async fn update_assignment(
        &self,
        assignment: InvestigatorAssignment,
    ) -> StorageResult<InvestigatorAssignment> {
        match self.assignments.get_mut(&assignment.id) {
            Some(mut entry) => {
                *entry = assignment.clone();
                Ok(assignment)
            }
            None => Err(StorageError::not_found(
                "InvestigatorAssignment",
                assignment.id,
            )),
        }
    }
}

#[async_trait]
impl InvestigationStorage for InMemoryStore {
    async fn create_investigation(
        &self,
        investigation: NewInvestigation,
    ) -> StorageResult<Investigation> {
        let id = Self::next(&self.investigation_seq);
        let row = investigation.into_investigation(id, OffsetDateTime::now_utc());
        self.investigations.insert(id, row.clone());
        Ok(row)
    }

    async fn get_investigation(
        &self,
        id: InvestigationId,
    ) -> StorageResult<Option<Investigation>> {
        Ok(self.investigations.get(&id).map(|entry| entry.value().clone()))
    }

    async fn update_investigation(
        &self,
        investigation: Investigation,
    ) -> StorageResult<Investigation> {
        match self.investigations.get_mut(&investigation.id) {
            Some(mut entry) => {
                *entry = investigation.clone();
                Ok(investigation)
            }
            None => Err(StorageError::not_found("Investigation", investigation.id)),
        }
    }
}

#[async_trait]
impl CorrectiveActionStorage for InMemoryStore {
    async fn create_corrective_action(
        &self,
        action: NewCorrectiveAction,
    ) -> StorageResult<CorrectiveAction> {
        let id = Self::next(&self.corrective_action_seq);
        let row = action.into_corrective_action(id, OffsetDateTime::now_utc());
        self.corrective_actions.insert(id, row.clone());
        Ok(row)
    }

    async fn get_corrective_action(
        &self,
        id: CorrectiveActionId,
    ) -> StorageResult<Option<CorrectiveAction>> {
        Ok(self
            .corrective_actions
            .get(&id)
            .map(|entry| entry.value().clone()))
    }

    async fn update_corrective_action(
        &self,
        action: CorrectiveAction,
    ) -> StorageResult<CorrectiveAction> {
        match self.corrective_actions.get_mut(&action.id) {
            Some(mut entry) => {
                *entry = action.clone();
                Ok(action)
            }
            None => Err(StorageError::not_found("CorrectiveAction", action.id)),
        }
    }
}

#[async_trait]
impl InvitationStorage for InMemoryStore {
    async fn create_invitation(
        &self,
        invitation: NewInvitation,
    ) -> StorageResult<SharedAccessInvitation> {
        let id = Uuid::new_v4();
        match self.token_index.entry(invitation.token.clone()) {
            Entry::Occupied(_) => Err(StorageError::already_exists(
                "SharedAccessInvitation",
                "token",
            )),
            Entry::Vacant(slot) => {
                let row = invitation.into_invitation(id);
                self.invitations.insert(id, row.clone());
                slot.insert(id);
                Ok(row)
            }
        }
    }

    async fn get_invitation(&self, id: Uuid) -> StorageResult<Option<SharedAccessInvitation>> {
        Ok(self.invitations.get(&id).map(|entry| entry.value().clone()))
    }

    async fn find_invitation_by_token(
        &self,
        token: &str,
    ) -> StorageResult<Option<SharedAccessInvitation>> {
        let Some(id) = self.token_index.get(token).map(|entry| *entry.value()) else {
            return Ok(None);
        };
        Ok(self.invitations.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_invitations(
        &self,
        resource: ResourceRef,
    ) -> StorageResult<Vec<SharedAccessInvitation>> {
        let mut rows: Vec<SharedAccessInvitation> = self
            .invitations
            .iter()
            .filter(|entry| entry.value().resource == resource)
            .map(|entry| entry.value().clone())
            .collect();
        rows.sort_by_key(|row| row.created_at);
        Ok(rows)
    }

    async fn update_invitation(
        &self,
        invitation: SharedAccessInvitation,
    ) -> StorageResult<SharedAccessInvitation> {
        match self.invitations.get_mut(&invitation.id) {
            Some(mut entry) => {
                *entry = invitation.clone();
                Ok(invitation)
            }
            None => Err(StorageError::not_found(
                "SharedAccessInvitation",
                invitation.id,
            )),
        }
    }

    async fn touch_invitation(&self, id: Uuid, at: OffsetDateTime) -> StorageResult<()> {
        match self.invitations.get_mut(&id) {
            Some(mut entry) => {
                entry.last_accessed_at = Some(at);
                Ok(())
            }
            None => Err(StorageError::not_found("SharedAccessInvitation", id)),
        }
    }
}

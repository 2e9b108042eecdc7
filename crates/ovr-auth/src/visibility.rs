//! Row-level visibility of incidents.
//!
//! Visibility is tiered by role:
//!
//! | tier | sees |
//! |---|---|
//! | elevated (QI, executive, admin, developer) | every non-draft incident |
//! | supervisory (supervisor, team lead) | own reports, plus non-drafts they supervise |
//! | everyone else | own non-draft reports |
//!
//! A draft is never visible to anyone but its reporter. Existence and
//! visibility are conflated: an invisible incident is reported as not found.

use std::sync::Arc;

use ovr_core::{
    CorrectiveAction, Incident, IncidentId, IncidentStatus, Investigation,
    InvestigatorAssignment, Principal, UserPrincipal, WorkflowError, WorkflowResult,
};
use ovr_storage::{IncidentFilter, WorkflowStorage};
use serde::Deserialize;

/// Listing flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VisibilityOptions {
    /// Also include the caller's own drafts.
    pub include_drafts: bool,
    /// Restrict to incidents the caller reported, drafts included.
    pub my_reports_only: bool,
}

impl VisibilityOptions {
    #[must_use]
    pub fn with_drafts() -> Self {
        Self {
            include_drafts: true,
            my_reports_only: false,
        }
    }
}

/// Builds the incident filter for a principal.
///
/// Shared-access principals see no incidents.
#[must_use]
pub fn incident_visibility(principal: &Principal, options: VisibilityOptions) -> IncidentFilter {
    match principal {
        Principal::User(user) => user_visibility(user, options),
        Principal::Shared(_) => IncidentFilter::Or(Vec::new()),
    }
}

fn user_visibility(user: &UserPrincipal, options: VisibilityOptions) -> IncidentFilter {
    let me = user.id;
    let not_draft = || IncidentFilter::StatusIsNot(IncidentStatus::Draft);

    if options.my_reports_only {
        return IncidentFilter::Reporter(me);
    }

    if user.is_elevated() {
        return if options.include_drafts {
            IncidentFilter::or([not_draft(), IncidentFilter::Reporter(me)])
        } else {
            not_draft()
        };
    }

    if user.is_supervisory() {
        return IncidentFilter::or([
            IncidentFilter::Reporter(me),
            IncidentFilter::and([IncidentFilter::Supervisor(me), not_draft()]),
        ]);
    }

    if options.include_drafts {
        IncidentFilter::Reporter(me)
    } else {
        IncidentFilter::and([IncidentFilter::Reporter(me), not_draft()])
    }
}

/// Returns `true` if an employee has a working relationship with an
/// investigation: elevated role, its creator, the incident's reporter or
/// department head, or an investigator assigned to the incident.
#[must_use]
pub fn investigation_relationship(
    user: &UserPrincipal,
    investigation: &Investigation,
    incident: &Incident,
    assignments: &[InvestigatorAssignment],
) -> bool {
    user.is_elevated()
        || investigation.created_by == user.id
        || incident.is_reported_by(user.id)
        || incident.is_department_head(user.id)
        || assignments
            .iter()
            .any(|assignment| assignment.investigator_id == user.id)
}

/// Returns `true` if an employee has a working relationship with a
/// corrective action: elevated role, its creator or assignee, or the
/// incident's department head.
#[must_use]
pub fn corrective_action_relationship(
    user: &UserPrincipal,
    action: &CorrectiveAction,
    incident: &Incident,
) -> bool {
    user.is_elevated()
        || action.created_by == user.id
        || action.assigned_to == Some(user.id)
        || incident.is_department_head(user.id)
}

/// Incident reads filtered by visibility.
#[derive(Clone)]
pub struct SecureDataAccess {
    storage: Arc<dyn WorkflowStorage>,
}

impl SecureDataAccess {
    pub fn new(storage: Arc<dyn WorkflowStorage>) -> Self {
        Self { storage }
    }

    /// Lists the incidents visible to the principal.
    pub async fn list_visible_incidents(
        &self,
        principal: &Principal,
        options: VisibilityOptions,
    ) -> WorkflowResult<Vec<Incident>> {
        let filter = incident_visibility(principal, options);
        tracing::debug!(?filter, "Listing visible incidents");
        Ok(self.storage.list_incidents(&filter).await?)
    }

    /// Reads one incident if the principal may see it.
    ///
    /// The caller's own drafts are included.
    pub async fn get_visible_incident(
        &self,
        principal: &Principal,
        id: IncidentId,
    ) -> WorkflowResult<Incident> {
        let incident = self
            .storage
            .get_incident(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Incident", id))?;

        if incident_visibility(principal, VisibilityOptions::with_drafts()).matches(&incident) {
            Ok(incident)
        } else {
            tracing::debug!(incident_id = id, "Incident exists but is not visible");
            Err(WorkflowError::not_found("Incident", id))
        }
    }
}

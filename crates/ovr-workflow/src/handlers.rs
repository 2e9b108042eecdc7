//! Action handlers and their registry.
//!
//! A handler is a pure function from an incident snapshot, a validated
//! payload and the acting user to exactly one [`Mutation`]. Handlers never
//! touch storage; the dispatcher persists the mutation.

use std::collections::HashMap;

use ovr_core::{
    AssignmentStatus, Incident, IncidentStatus, InvestigatorAssignment,
    NewInvestigatorAssignment, UserPrincipal, WorkflowAction, WorkflowError, WorkflowResult,
};
use time::OffsetDateTime;

use crate::payload::{
    ActionPayload, AssignInvestigatorPayload, HodSubmitPayload, QiAssignHodPayload,
    QiClosePayload, SubmitFindingsPayload, SupervisorApprovePayload,
};

/// Inputs available to a handler.
#[derive(Debug, Clone, Copy)]
pub struct ActionContext<'a> {
    pub incident: &'a Incident,
    /// Loaded only for actions that need them; empty otherwise.
    pub assignments: &'a [InvestigatorAssignment],
    pub user: &'a UserPrincipal,
    pub now: OffsetDateTime,
}

impl ActionContext<'_> {
    /// A copy of the incident with `updated_at` stamped.
    fn touched_incident(&self) -> Incident {
        let mut incident = self.incident.clone();
        incident.updated_at = self.now;
        incident
    }
}

/// The single write produced by a handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    UpdateIncident(Incident),
    InsertAssignment(NewInvestigatorAssignment),
    UpdateAssignment(InvestigatorAssignment),
}

/// Computes the mutation for one workflow action.
pub trait ActionHandler: Send + Sync {
    /// The action this handler implements.
    fn action(&self) -> WorkflowAction;

    /// Computes the mutation. Status and role have already been checked.
    fn handle(&self, ctx: &ActionContext<'_>, payload: &ActionPayload)
    -> WorkflowResult<Mutation>;
}

fn payload_mismatch(expected: WorkflowAction, payload: &ActionPayload) -> WorkflowError {
    WorkflowError::internal(format!(
        "{expected} handler received a {} payload",
        payload.action()
    ))
}

// ============================================================================
// Handlers
// ============================================================================

/// Retired supervisor approval step.
pub struct SupervisorApproveHandler;

impl ActionHandler for SupervisorApproveHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::SupervisorApprove
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::SupervisorApprove(SupervisorApprovePayload { notes }) = payload else {
            return Err(payload_mismatch(self.action(), payload));
        };
        let mut incident = ctx.touched_incident();
        incident.supervisor_id = Some(ctx.user.id);
        incident.supervisor_action = Some(match notes {
            Some(notes) => format!("approved: {notes}"),
            None => "approved".to_string(),
        });
        incident.supervisor_action_at = Some(ctx.now);
        incident.status = IncidentStatus::SupervisorApproved;
        Ok(Mutation::UpdateIncident(incident))
    }
}

/// QI (re)assigns the department head. The status stays `hod_assigned`.
pub struct QiAssignHodHandler;

impl ActionHandler for QiAssignHodHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::QiAssignHod
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::QiAssignHod(QiAssignHodPayload {
            department_head_id,
            notes,
        }) = payload
        else {
            return Err(payload_mismatch(self.action(), payload));
        };
        let mut incident = ctx.touched_incident();
        if incident.qi_received_by.is_none() {
            incident.qi_received_by = Some(ctx.user.id);
            incident.qi_received_at = Some(ctx.now);
        }
        incident.qi_assigned_by = Some(ctx.user.id);
        incident.qi_assigned_at = Some(ctx.now);
        incident.qi_assignment_notes = notes.clone();
        incident.department_head_id = Some(*department_head_id);
        incident.hod_assigned_at = Some(ctx.now);
        Ok(Mutation::UpdateIncident(incident))
    }
}

/// Adds an investigator to the incident.
pub struct AssignInvestigatorHandler;

impl ActionHandler for AssignInvestigatorHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::AssignInvestigator
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::AssignInvestigator(AssignInvestigatorPayload { investigator_id }) =
            payload
        else {
            return Err(payload_mismatch(self.action(), payload));
        };
        if ctx
            .assignments
            .iter()
            .any(|assignment| assignment.investigator_id == *investigator_id)
        {
            return Err(WorkflowError::invalid_field(
                "data.investigatorId",
                format!("User {investigator_id} is already assigned to this incident"),
            ));
        }
        Ok(Mutation::InsertAssignment(NewInvestigatorAssignment {
            incident_id: ctx.incident.id,
            investigator_id: *investigator_id,
            assigned_by: ctx.user.id,
            assigned_at: ctx.now,
        }))
    }
}

/// An assigned investigator records findings, once.
pub struct SubmitFindingsHandler;

impl ActionHandler for SubmitFindingsHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::SubmitFindings
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::SubmitFindings(SubmitFindingsPayload { findings }) = payload else {
            return Err(payload_mismatch(self.action(), payload));
        };
        let Some(assignment) = ctx
            .assignments
            .iter()
            .find(|assignment| assignment.investigator_id == ctx.user.id)
        else {
            return Err(WorkflowError::validation(
                "You are not assigned to investigate this incident",
            ));
        };
        if assignment.is_submitted() {
            return Err(WorkflowError::validation(
                "Findings have already been submitted",
            ));
        }

        let mut assignment = assignment.clone();
        assignment.findings = Some(findings.clone());
        assignment.status = AssignmentStatus::Submitted;
        assignment.submitted_at = Some(ctx.now);
        Ok(Mutation::UpdateAssignment(assignment))
    }
}

/// The department head submits the investigation to QI.
pub struct HodSubmitHandler;

impl ActionHandler for HodSubmitHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::HodSubmit
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::HodSubmit(HodSubmitPayload {
            investigation_findings,
            problems_identified,
            cause_classification,
            cause_details,
            prevention_recommendation,
        }) = payload
        else {
            return Err(payload_mismatch(self.action(), payload));
        };
        let mut incident = ctx.touched_incident();
        incident.investigation_findings = Some(investigation_findings.clone());
        incident.problems_identified = Some(problems_identified.clone());
        incident.cause_classification = Some(cause_classification.clone());
        incident.cause_details = cause_details.clone();
        incident.prevention_recommendation = Some(prevention_recommendation.clone());
        incident.hod_action_date = Some(ctx.now);
        incident.hod_submitted_at = Some(ctx.now);
        incident.status = IncidentStatus::QiFinalReview;
        Ok(Mutation::UpdateIncident(incident))
    }
}

/// QI closes the incident. This is the only transition into `closed`.
pub struct QiCloseHandler;

impl ActionHandler for QiCloseHandler {
    fn action(&self) -> WorkflowAction {
        WorkflowAction::QiClose
    }

    fn handle(
        &self,
        ctx: &ActionContext<'_>,
        payload: &ActionPayload,
    ) -> WorkflowResult<Mutation> {
        let ActionPayload::QiClose(QiClosePayload {
            feedback,
            severity_level,
            form_complete,
            cause_identified,
            cause_classified,
            prevention_appropriate,
            feedback_appropriate,
        }) = payload
        else {
            return Err(payload_mismatch(self.action(), payload));
        };
        let mut incident = ctx.touched_incident();
        incident.qi_feedback = Some(feedback.clone());
        incident.qi_form_complete = *form_complete;
        incident.qi_cause_identified = *cause_identified;
        incident.qi_cause_classified = *cause_classified;
        incident.qi_prevention_appropriate = *prevention_appropriate;
        incident.qi_feedback_appropriate = *feedback_appropriate;
        incident.severity_level = Some(*severity_level);
        incident.closed_at = Some(ctx.now);
        incident.status = IncidentStatus::Closed;
        Ok(Mutation::UpdateIncident(incident))
    }
}

// ============================================================================
// Registry
// ============================================================================

/// Immutable map from action to handler.
pub struct HandlerRegistry {
    handlers: HashMap<WorkflowAction, Box<dyn ActionHandler>>,
}

impl HandlerRegistry {
    /// Builds a registry, requiring exactly one handler per action.
    pub fn new(handlers: Vec<Box<dyn ActionHandler>>) -> WorkflowResult<Self> {
        let mut map: HashMap<WorkflowAction, Box<dyn ActionHandler>> = HashMap::new();
        for handler in handlers {
            let action = handler.action();
            if map.insert(action, handler).is_some() {
                return Err(WorkflowError::internal(format!(
                    "duplicate handler registered for {action}"
                )));
            }
        }
        if let Some(missing) = WorkflowAction::ALL
            .into_iter()
            .find(|action| !map.contains_key(action))
        {
            return Err(WorkflowError::internal(format!(
                "no handler registered for {missing}"
            )));
        }
        Ok(Self { handlers: map })
    }

    /// The built-in handlers.
    pub fn standard() -> WorkflowResult<Self> {
        Self::new(vec![
            Box::new(SupervisorApproveHandler),
            Box::new(QiAssignHodHandler),
            Box::new(AssignInvestigatorHandler),
            Box::new(SubmitFindingsHandler),
            Box::new(HodSubmitHandler),
            Box::new(QiCloseHandler),
        ])
    }

    pub fn get(&self, action: WorkflowAction) -> Option<&dyn ActionHandler> {
        self.handlers.get(&action).map(|handler| handler.as_ref())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<&str> = self.handlers.keys().map(WorkflowAction::as_str).collect();
        actions.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("actions", &actions)
            .finish()
    }
}

//! The action dispatcher.
//!
//! One dispatch is: resolve the action name, validate the payload, load the
//! incident (plus assignments when the action needs them), check
//! permissions, run the handler and persist its single mutation.

use std::str::FromStr;
use std::sync::Arc;

use ovr_auth::{can_perform_action, validate_action};
use ovr_core::{
    Incident, IncidentId, InvestigatorAssignment, Principal, WorkflowAction, WorkflowError,
    WorkflowResult,
};
use ovr_storage::WorkflowStorage;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;

use crate::handlers::{ActionContext, HandlerRegistry, Mutation};
use crate::payload::ActionPayload;

/// Wire form of an action request.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ActionRequest {
    pub action: String,
    #[serde(default)]
    pub data: Option<Value>,
}

/// The persisted result of an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ActionOutcome {
    Incident(Box<Incident>),
    Assignment(InvestigatorAssignment),
}

/// Routes actions to their handlers.
#[derive(Clone)]
pub struct Dispatcher {
    storage: Arc<dyn WorkflowStorage>,
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    pub fn new(storage: Arc<dyn WorkflowStorage>, registry: Arc<HandlerRegistry>) -> Self {
        Self { storage, registry }
    }

    /// A dispatcher with the built-in handlers.
    pub fn standard(storage: Arc<dyn WorkflowStorage>) -> WorkflowResult<Self> {
        Ok(Self::new(storage, Arc::new(HandlerRegistry::standard()?)))
    }

    /// Performs `action_name` on an incident.
    ///
    /// # Errors
    ///
    /// - `Validation` for an unknown action, a malformed payload or a
    ///   violated domain rule
    /// - `NotFound` if the incident does not exist
    /// - `Authorization` if the status or role precondition fails
    pub async fn dispatch(
        &self,
        principal: &Principal,
        incident_id: IncidentId,
        action_name: &str,
        data: Option<&Value>,
    ) -> WorkflowResult<ActionOutcome> {
        let action = WorkflowAction::from_str(action_name)
            .map_err(|err| WorkflowError::invalid_field("action", err.to_string()))?;
        let payload = ActionPayload::parse(action, data)?;

        let (incident, assignments) = self.load(incident_id, action).await?;
        validate_action(principal, action, &incident, &assignments)?;

        // Token principals are rejected above.
        let user = principal
            .as_user()
            .ok_or_else(|| WorkflowError::internal("dispatch reached without a user principal"))?;

        let handler = self
            .registry
            .get(action)
            .ok_or_else(|| WorkflowError::internal(format!("no handler for {action}")))?;
        let ctx = ActionContext {
            incident: &incident,
            assignments: &assignments,
            user,
            now: OffsetDateTime::now_utc(),
        };
        let mutation = handler.handle(&ctx, &payload)?;
        let outcome = self.apply(mutation).await?;

        tracing::info!(
            incident_id,
            action = %action,
            user_id = user.id,
            "Workflow action applied"
        );
        Ok(outcome)
    }

    /// Lists the actions the principal may currently perform.
    pub async fn allowed_actions(
        &self,
        principal: &Principal,
        incident_id: IncidentId,
    ) -> WorkflowResult<Vec<WorkflowAction>> {
        let incident = self.load_incident(incident_id).await?;
        let assignments = self.storage.list_assignments(incident_id).await?;
        Ok(WorkflowAction::ALL
            .into_iter()
            .filter(|action| can_perform_action(principal, *action, &incident, &assignments))
            .collect())
    }

    async fn load(
        &self,
        incident_id: IncidentId,
        action: WorkflowAction,
    ) -> WorkflowResult<(Incident, Vec<InvestigatorAssignment>)> {
        let incident = self.load_incident(incident_id).await?;
        let assignments = if action.needs_assignments() {
            self.storage.list_assignments(incident_id).await?
        } else {
            Vec::new()
        };
        Ok((incident, assignments))
    }

    async fn load_incident(&self, incident_id: IncidentId) -> WorkflowResult<Incident> {
        self.storage
            .get_incident(incident_id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Incident", incident_id))
    }

    async fn apply(&self, mutation: Mutation) -> WorkflowResult<ActionOutcome> {
        let outcome = match mutation {
            Mutation::UpdateIncident(incident) => {
                ActionOutcome::Incident(Box::new(self.storage.update_incident(incident).await?))
            }
            Mutation::InsertAssignment(assignment) => {
                let investigator = assignment.investigator_id;
                let stored = self
                    .storage
                    .insert_assignment(assignment)
                    .await
                    .map_err(|err| {
                        if err.is_already_exists() {
                            WorkflowError::invalid_field(
                                "data.investigatorId",
                                format!("User {investigator} is already assigned to this incident"),
                            )
                        } else {
                            err.into()
                        }
                    })?;
                ActionOutcome::Assignment(stored)
            }
            Mutation::UpdateAssignment(assignment) => {
                ActionOutcome::Assignment(self.storage.update_assignment(assignment).await?)
            }
        };
        Ok(outcome)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

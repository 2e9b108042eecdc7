//! Corrective action tracking.

use std::sync::Arc;

use ovr_auth::SharedAccessManager;
use ovr_core::{
    CorrectiveAction, CorrectiveActionId, CorrectiveActionStatus, Principal, ResourceRef,
    WorkflowError, WorkflowResult, checklist,
};
use ovr_storage::WorkflowStorage;
use serde::Serialize;
use time::OffsetDateTime;

/// Checklist completion counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChecklistProgress {
    pub completed: usize,
    pub total: usize,
}

/// Access-checked corrective action operations.
#[derive(Clone)]
pub struct CorrectiveActionService {
    storage: Arc<dyn WorkflowStorage>,
    sharing: SharedAccessManager,
}

impl CorrectiveActionService {
    pub fn new(storage: Arc<dyn WorkflowStorage>, sharing: SharedAccessManager) -> Self {
        Self { storage, sharing }
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: CorrectiveActionId,
    ) -> WorkflowResult<CorrectiveAction> {
        self.sharing
            .verify_access(principal, ResourceRef::corrective_action(id))
            .await?;
        self.load(id).await
    }

    /// Flips one checklist item.
    ///
    /// # Errors
    ///
    /// `Validation` if the action is closed, its checklist is malformed, or
    /// `item_id` is not in it.
    pub async fn toggle_checklist_item(
        &self,
        principal: &Principal,
        id: CorrectiveActionId,
        item_id: &str,
    ) -> WorkflowResult<CorrectiveAction> {
        let grant = self
            .sharing
            .verify_access(principal, ResourceRef::corrective_action(id))
            .await?;
        let mut action = self.load(id).await?;
        if action.is_closed() {
            return Err(WorkflowError::validation(
                "Closed corrective actions cannot be modified",
            ));
        }

        let now = OffsetDateTime::now_utc();
        action.checklist = checklist::toggle_item(&action.checklist, item_id, grant.acting_user, now)?;
        action.updated_at = now;
        let action = self.storage.update_corrective_action(action).await?;

        tracing::debug!(
            corrective_action_id = id,
            item_id,
            user_id = grant.acting_user,
            "Checklist item toggled"
        );
        Ok(action)
    }

    /// Closes the action once every checklist item is done.
    pub async fn close(
        &self,
        principal: &Principal,
        id: CorrectiveActionId,
    ) -> WorkflowResult<CorrectiveAction> {
        let grant = self
            .sharing
            .verify_access(principal, ResourceRef::corrective_action(id))
            .await?;
        let mut action = self.load(id).await?;
        if action.is_closed() {
            return Err(WorkflowError::validation(
                "Corrective action is already closed",
            ));
        }

        let items = checklist::parse(&action.checklist)?;
        if !checklist::is_complete(&items) {
            let (completed, total) = checklist::progress(&items);
            return Err(WorkflowError::invalid_field(
                "checklist",
                format!(
                    "All checklist items must be completed before closing ({completed}/{total} done)"
                ),
            ));
        }

        let now = OffsetDateTime::now_utc();
        action.status = CorrectiveActionStatus::Closed;
        action.closed_at = Some(now);
        action.closed_by = Some(grant.acting_user);
        action.updated_at = now;
        let action = self.storage.update_corrective_action(action).await?;

        tracing::info!(
            corrective_action_id = id,
            incident_id = action.incident_id,
            user_id = grant.acting_user,
            "Corrective action closed"
        );
        Ok(action)
    }

    pub async fn checklist_progress(
        &self,
        principal: &Principal,
        id: CorrectiveActionId,
    ) -> WorkflowResult<ChecklistProgress> {
        let action = self.get(principal, id).await?;
        let items = checklist::parse(&action.checklist)?;
        let (completed, total) = checklist::progress(&items);
        Ok(ChecklistProgress { completed, total })
    }

    async fn load(&self, id: CorrectiveActionId) -> WorkflowResult<CorrectiveAction> {
        self.storage
            .get_corrective_action(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("CorrectiveAction", id))
    }
}

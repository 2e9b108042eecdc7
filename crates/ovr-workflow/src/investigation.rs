//! Access-checked investigation records.

use std::sync::Arc;

use ovr_auth::SharedAccessManager;
use ovr_core::{
    Investigation, InvestigationId, InvestigationUpdate, Principal, ResourceRef, WorkflowError,
    WorkflowResult,
};
use ovr_storage::WorkflowStorage;
use time::OffsetDateTime;

#[derive(Clone)]
pub struct InvestigationService {
    storage: Arc<dyn WorkflowStorage>,
    sharing: SharedAccessManager,
}

impl InvestigationService {
    pub fn new(storage: Arc<dyn WorkflowStorage>, sharing: SharedAccessManager) -> Self {
        Self { storage, sharing }
    }

    pub async fn get(
        &self,
        principal: &Principal,
        id: InvestigationId,
    ) -> WorkflowResult<Investigation> {
        self.sharing
            .verify_access(principal, ResourceRef::investigation(id))
            .await?;
        self.load(id).await
    }

    /// Applies a partial update. An update that changes nothing is rejected.
    pub async fn update(
        &self,
        principal: &Principal,
        id: InvestigationId,
        update: InvestigationUpdate,
    ) -> WorkflowResult<Investigation> {
        if update.is_empty() {
            return Err(WorkflowError::validation(
                "At least one of findings, rootCause or recommendations is required",
            ));
        }
        let grant = self
            .sharing
            .verify_access(principal, ResourceRef::investigation(id))
            .await?;
        let mut investigation = self.load(id).await?;
        update.apply(&mut investigation, OffsetDateTime::now_utc());
        let investigation = self.storage.update_investigation(investigation).await?;

        tracing::debug!(
            investigation_id = id,
            user_id = grant.acting_user,
            shared = grant.invitation_id.is_some(),
            "Investigation updated"
        );
        Ok(investigation)
    }

    async fn load(&self, id: InvestigationId) -> WorkflowResult<Investigation> {
        self.storage
            .get_investigation(id)
            .await?
            .ok_or_else(|| WorkflowError::not_found("Investigation", id))
    }
}

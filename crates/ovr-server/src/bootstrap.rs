//! Demo data for a fresh in-memory store.
//!
//! Incident reporting forms live outside this service, so a local instance
//! has nothing to act on without seed records.

use ovr_core::{
    ChecklistItem, IncidentStatus, NewCorrectiveAction, NewIncident, NewInvestigation,
    WorkflowResult, checklist,
};
use ovr_storage::WorkflowStorage;
use tracing::info;

/// Reporter of every seeded incident.
pub const DEMO_REPORTER: i64 = 3;
/// Department head assigned to the seeded incidents.
pub const DEMO_DEPARTMENT_HEAD: i64 = 7;
/// QI analyst recorded as creator of the seeded records.
pub const DEMO_QI: i64 = 2;

/// Ids of the seeded records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DemoData {
    pub open_incident: i64,
    pub final_review_incident: i64,
    pub draft_incident: i64,
    pub investigation: i64,
    pub corrective_action: i64,
}

pub async fn seed_demo_data(storage: &dyn WorkflowStorage) -> WorkflowResult<DemoData> {
    let open = storage
        .create_incident(
            NewIncident::submitted(DEMO_REPORTER).with_department_head(DEMO_DEPARTMENT_HEAD),
        )
        .await?;
    let final_review = storage
        .create_incident(
            NewIncident::submitted(DEMO_REPORTER)
                .with_department_head(DEMO_DEPARTMENT_HEAD)
                .with_status(IncidentStatus::QiFinalReview),
        )
        .await?;
    let draft = storage
        .create_incident(NewIncident::draft(DEMO_REPORTER))
        .await?;

    let investigation = storage
        .create_investigation(NewInvestigation {
            incident_id: open.id,
            created_by: DEMO_QI,
        })
        .await?;

    let items = [
        ChecklistItem::new("order-parts", "Order replacement bed rails"),
        ChecklistItem::new("install", "Install and test rails"),
        ChecklistItem::new("train", "Brief night shift staff"),
    ];
    let action = storage
        .create_corrective_action(NewCorrectiveAction {
            incident_id: final_review.id,
            title: "Replace ward B bed rails".to_string(),
            description: Some("Follow-up from fall incident".to_string()),
            assigned_to: Some(DEMO_DEPARTMENT_HEAD),
            created_by: DEMO_QI,
            checklist: checklist::serialize(&items)?,
            due_date: None,
        })
        .await?;

    let seeded = DemoData {
        open_incident: open.id,
        final_review_incident: final_review.id,
        draft_incident: draft.id,
        investigation: investigation.id,
        corrective_action: action.id,
    };
    info!(?seeded, "Seeded demo data");
    Ok(seeded)
}

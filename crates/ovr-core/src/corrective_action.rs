//! Corrective actions arising from incidents.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{CorrectiveActionId, IncidentId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectiveActionStatus {
    Open,
    Closed,
}

/// A remediation task tracked to completion with a checklist.
///
/// The checklist is stored as an opaque text blob; see [`crate::checklist`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CorrectiveAction {
    pub id: CorrectiveActionId,
    pub incident_id: IncidentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub checklist: String,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<OffsetDateTime>,
    pub status: CorrectiveActionStatus,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<UserId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl CorrectiveAction {
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == CorrectiveActionStatus::Closed
    }
}

/// Fields required to open a corrective action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCorrectiveAction {
    pub incident_id: IncidentId,
    pub title: String,
    pub description: Option<String>,
    pub assigned_to: Option<UserId>,
    pub created_by: UserId,
    pub checklist: String,
    pub due_date: Option<OffsetDateTime>,
}

impl NewCorrectiveAction {
    /// Materialises the action with the given id, in `open` status.
    #[must_use]
    pub fn into_corrective_action(
        self,
        id: CorrectiveActionId,
        now: OffsetDateTime,
    ) -> CorrectiveAction {
        CorrectiveAction {
            id,
            incident_id: self.incident_id,
            title: self.title,
            description: self.description,
            assigned_to: self.assigned_to,
            created_by: self.created_by,
            checklist: self.checklist,
            due_date: self.due_date,
            status: CorrectiveActionStatus::Open,
            closed_at: None,
            closed_by: None,
            created_at: now,
            updated_at: now,
        }
    }
}

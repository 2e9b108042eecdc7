//! Investigation records that can be shared with external investigators.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{IncidentId, InvestigationId, UserId};

/// Working investigation record behind an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investigation {
    pub id: InvestigationId,
    pub incident_id: IncidentId,
    pub created_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Fields required to open an investigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvestigation {
    pub incident_id: IncidentId,
    pub created_by: UserId,
}

impl NewInvestigation {
    /// Materialises the investigation with the given id and creation time.
    #[must_use]
    pub fn into_investigation(self, id: InvestigationId, now: OffsetDateTime) -> Investigation {
        Investigation {
            id,
            incident_id: self.incident_id,
            created_by: self.created_by,
            findings: None,
            root_cause: None,
            recommendations: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of the editable investigation fields.
///
/// Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InvestigationUpdate {
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub root_cause: Option<String>,
    #[serde(default)]
    pub recommendations: Option<String>,
}

impl InvestigationUpdate {
    /// Returns `true` if the update changes nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.findings.is_none() && self.root_cause.is_none() && self.recommendations.is_none()
    }

    /// Applies the update in place.
    pub fn apply(self, investigation: &mut Investigation, now: OffsetDateTime) {
        if let Some(findings) = self.findings {
            investigation.findings = Some(findings);
        }
        if let Some(root_cause) = self.root_cause {
            investigation.root_cause = Some(root_cause);
        }
        if let Some(recommendations) = self.recommendations {
            investigation.recommendations = Some(recommendations);
        }
        investigation.updated_at = now;
    }
}

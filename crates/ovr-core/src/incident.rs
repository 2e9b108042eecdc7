//! The incident aggregate and its investigator assignments.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::status::IncidentStatus;
use crate::{AssignmentId, IncidentId, UserId};

/// Severity recorded by QI at closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityLevel {
    /// Every severity level.
    pub const ALL: [SeverityLevel; 4] = [Self::Low, Self::Medium, Self::High, Self::Critical];

    /// Returns the wire name of the level.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Incident
// =============================================================================

/// An occurrence/variance report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    pub id: IncidentId,
    pub status: IncidentStatus,
    pub reporter_id: UserId,

    // Supervisor review (retired step, fields kept for legacy rows)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_action: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub supervisor_action_at: Option<OffsetDateTime>,

    // QI department assignment
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi_received_by: Option<UserId>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub qi_received_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi_assigned_by: Option<UserId>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub qi_assigned_at: Option<OffsetDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi_assignment_notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_head_id: Option<UserId>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub hod_assigned_at: Option<OffsetDateTime>,

    // HOD investigation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub problems_identified: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_classification: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prevention_recommendation: Option<String>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub hod_action_date: Option<OffsetDateTime>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub hod_submitted_at: Option<OffsetDateTime>,

    // QI closure
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qi_feedback: Option<String>,
    #[serde(default)]
    pub qi_form_complete: bool,
    #[serde(default)]
    pub qi_cause_identified: bool,
    #[serde(default)]
    pub qi_cause_classified: bool,
    #[serde(default)]
    pub qi_prevention_appropriate: bool,
    #[serde(default)]
    pub qi_feedback_appropriate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<SeverityLevel>,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed_at: Option<OffsetDateTime>,

    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<OffsetDateTime>,
}

impl Incident {
    /// Returns `true` if the user authored this incident.
    #[must_use]
    pub fn is_reported_by(&self, user: UserId) -> bool {
        self.reporter_id == user
    }

    /// Returns `true` if the user is the assigned department head.
    #[must_use]
    pub fn is_department_head(&self, user: UserId) -> bool {
        self.department_head_id == Some(user)
    }
}

/// Fields required to record a new incident.
///
/// Creating incidents belongs to the reporting forms, so this is used by
/// storage backends and fixtures rather than by any workflow action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIncident {
    pub reporter_id: UserId,
    pub status: IncidentStatus,
    pub supervisor_id: Option<UserId>,
    pub department_head_id: Option<UserId>,
}

impl NewIncident {
    /// A submitted incident, which enters the workflow at `hod_assigned`.
    #[must_use]
    pub fn submitted(reporter_id: UserId) -> Self {
        Self {
            reporter_id,
            status: IncidentStatus::HodAssigned,
            supervisor_id: None,
            department_head_id: None,
        }
    }

    /// An unsubmitted draft.
    #[must_use]
    pub fn draft(reporter_id: UserId) -> Self {
        Self {
            status: IncidentStatus::Draft,
            ..Self::submitted(reporter_id)
        }
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: IncidentStatus) -> Self {
        self.status = status;
        self
    }

    /// Sets the recorded supervisor.
    #[must_use]
    pub fn with_supervisor(mut self, supervisor_id: UserId) -> Self {
        self.supervisor_id = Some(supervisor_id);
        self
    }

    /// Sets the assigned department head.
    #[must_use]
    pub fn with_department_head(mut self, department_head_id: UserId) -> Self {
        self.department_head_id = Some(department_head_id);
        self
    }

    /// Materialises the incident with the given id and creation time.
    #[must_use]
    pub fn into_incident(self, id: IncidentId, now: OffsetDateTime) -> Incident {
        let submitted_at = (!self.status.is_draft()).then_some(now);
        Incident {
            id,
            status: self.status,
            reporter_id: self.reporter_id,
            supervisor_id: self.supervisor_id,
            supervisor_action: None,
            supervisor_action_at: None,
            qi_received_by: None,
            qi_received_at: None,
            qi_assigned_by: None,
            qi_assigned_at: None,
            qi_assignment_notes: None,
            department_head_id: self.department_head_id,
            hod_assigned_at: self.department_head_id.map(|_| now),
            investigation_findings: None,
            problems_identified: None,
            cause_classification: None,
            cause_details: None,
            prevention_recommendation: None,
            hod_action_date: None,
            hod_submitted_at: None,
            qi_feedback: None,
            qi_form_complete: false,
            qi_cause_identified: false,
            qi_cause_classified: false,
            qi_prevention_appropriate: false,
            qi_feedback_appropriate: false,
            severity_level: None,
            closed_at: None,
            created_at: now,
            updated_at: now,
            submitted_at,
        }
    }
}

// =============================================================================
// Investigator Assignment
// =============================================================================

/// Progress of an investigator assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentStatus {
    Pending,
    Submitted,
}

/// A user assigned to investigate an incident.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestigatorAssignment {
    pub id: AssignmentId,
    pub incident_id: IncidentId,
    pub investigator_id: UserId,
    pub assigned_by: UserId,
    pub status: AssignmentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub assigned_at: OffsetDateTime,
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub submitted_at: Option<OffsetDateTime>,
}

impl InvestigatorAssignment {
    /// Returns `true` once findings have been submitted.
    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.status == AssignmentStatus::Submitted
    }
}

/// A pending assignment that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvestigatorAssignment {
    pub incident_id: IncidentId,
    pub investigator_id: UserId,
    pub assigned_by: UserId,
    pub assigned_at: OffsetDateTime,
}

impl NewInvestigatorAssignment {
    /// Materialises the assignment with the given id, in `pending` status.
    #[must_use]
    pub fn into_assignment(self, id: AssignmentId) -> InvestigatorAssignment {
        InvestigatorAssignment {
            id,
            incident_id: self.incident_id,
            investigator_id: self.investigator_id,
            assigned_by: self.assigned_by,
            status: AssignmentStatus::Pending,
            findings: None,
            assigned_at: self.assigned_at,
            submitted_at: None,
        }
    }
}

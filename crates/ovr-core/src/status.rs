//! Incident lifecycle statuses and workflow action names.
//!
//! Both are closed enumerations so that every table keyed by them is an
//! exhaustive `match`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a status or action name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{name}'")]
pub struct UnknownName {
    /// What was being parsed ("status", "action", "role").
    pub kind: &'static str,
    /// The rejected input.
    pub name: String,
}

impl UnknownName {
    pub(crate) fn new(kind: &'static str, name: &str) -> Self {
        Self {
            kind,
            name: name.to_string(),
        }
    }
}

// =============================================================================
// Incident Status
// =============================================================================

/// Lifecycle status of an incident report.
///
/// Live incidents enter the workflow at `HodAssigned` right after submission.
/// `QiReview` and `Rejected` only exist in legacy data; no action targets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IncidentStatus {
    Draft,
    Submitted,
    SupervisorApproved,
    QiReview,
    HodAssigned,
    QiFinalReview,
    Closed,
    Rejected,
}

impl IncidentStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [IncidentStatus; 8] = [
        Self::Draft,
        Self::Submitted,
        Self::SupervisorApproved,
        Self::QiReview,
        Self::HodAssigned,
        Self::QiFinalReview,
        Self::Closed,
        Self::Rejected,
    ];

    /// Returns the wire name of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Submitted => "submitted",
            Self::SupervisorApproved => "supervisor_approved",
            Self::QiReview => "qi_review",
            Self::HodAssigned => "hod_assigned",
            Self::QiFinalReview => "qi_final_review",
            Self::Closed => "closed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns `true` for the draft status.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// Returns `true` for the terminal status.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Closed)
    }
}

impl fmt::Display for IncidentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IncidentStatus {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| UnknownName::new("status", s))
    }
}

// =============================================================================
// Workflow Action
// =============================================================================

/// The closed set of actions accepted by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowAction {
    /// Retired supervisor approval step. Never legal in any status.
    SupervisorApprove,
    /// QI assigns (or re-assigns) the department head.
    QiAssignHod,
    /// Department head assigns an investigator.
    AssignInvestigator,
    /// An assigned investigator submits findings.
    SubmitFindings,
    /// Department head submits the investigation.
    HodSubmit,
    /// QI closes the incident.
    QiClose,
}

impl WorkflowAction {
    /// Every action.
    pub const ALL: [WorkflowAction; 6] = [
        Self::SupervisorApprove,
        Self::QiAssignHod,
        Self::AssignInvestigator,
        Self::SubmitFindings,
        Self::HodSubmit,
        Self::QiClose,
    ];

    /// Returns the wire name of the action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SupervisorApprove => "supervisor-approve",
            Self::QiAssignHod => "qi-assign-hod",
            Self::AssignInvestigator => "assign-investigator",
            Self::SubmitFindings => "submit-findings",
            Self::HodSubmit => "hod-submit",
            Self::QiClose => "qi-close",
        }
    }

    /// Returns `true` if the action needs the incident's investigator
    /// assignments loaded alongside the incident.
    #[must_use]
    pub fn needs_assignments(&self) -> bool {
        matches!(self, Self::AssignInvestigator | Self::SubmitFindings)
    }
}

impl fmt::Display for WorkflowAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowAction {
    type Err = UnknownName;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| UnknownName::new("action", s))
    }
}

//! # ovr-core
//!
//! Domain model for the OVR (occurrence/variance report) incident workflow.
//!
//! This crate provides:
//! - The incident aggregate and its closed status enumeration
//! - Workflow action names
//! - Role taxonomy and request principals
//! - Investigator assignments, investigations and corrective actions
//! - Shared-access invitation records
//! - The checklist codec embedded in corrective actions
//! - The shared [`WorkflowError`] type
//!
//! Nothing here performs I/O. Persistence is the job of the storage
//! collaborator defined in `ovr-storage`.

pub mod checklist;
pub mod corrective_action;
pub mod error;
pub mod incident;
pub mod investigation;
pub mod invitation;
pub mod principal;
pub mod status;

pub use checklist::{ChecklistError, ChecklistItem};
pub use corrective_action::{CorrectiveAction, CorrectiveActionStatus, NewCorrectiveAction};
pub use error::{ErrorCategory, WorkflowError};
pub use incident::{
    AssignmentStatus, Incident, InvestigatorAssignment, NewIncident, NewInvestigatorAssignment,
    SeverityLevel,
};
pub use investigation::{Investigation, InvestigationUpdate, NewInvestigation};
pub use invitation::{
    InvitationRole, InvitationStatus, NewInvitation, ResourceRef, SharedAccessInvitation,
    SharedResourceKind,
};
pub use principal::{Principal, Role, SharedPrincipal, UserPrincipal};
pub use status::{IncidentStatus, UnknownName, WorkflowAction};

/// Identifier of a user known to the external authentication system.
pub type UserId = i64;
/// Identifier of an incident report.
pub type IncidentId = i64;
/// Identifier of an investigator assignment row.
pub type AssignmentId = i64;
/// Identifier of an investigation record.
pub type InvestigationId = i64;
/// Identifier of a corrective action.
pub type CorrectiveActionId = i64;

/// Type alias for workflow results.
pub type WorkflowResult<T> = Result<T, WorkflowError>;

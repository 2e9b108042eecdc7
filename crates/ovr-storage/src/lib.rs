//! # ovr-storage
//!
//! Storage contract for the OVR workflow engine.
//!
//! The workflow core never persists anything itself: it loads snapshots,
//! computes a mutation and hands it back to a backend implementing the
//! traits defined here. Relational integrity (for example the uniqueness of
//! an investigator per incident) is the backend's job.
//!
//! ## Overview
//!
//! - [`IncidentStorage`], [`AssignmentStorage`], [`InvestigationStorage`],
//!   [`CorrectiveActionStorage`], [`InvitationStorage`]: one trait per table
//! - [`WorkflowStorage`]: the union, implemented automatically
//! - [`IncidentFilter`]: the row-level visibility predicate, evaluable in
//!   memory or rendered to a SQL `WHERE` clause
//!
//! Writes are unconditional. There is no optimistic locking, so the last
//! write wins.

mod error;
mod filter;
mod traits;

pub use error::{StorageError, StorageResult};
pub use filter::{IncidentFilter, SqlFragment, SqlParam};
pub use traits::{
    AssignmentStorage, CorrectiveActionStorage, IncidentStorage, InvestigationStorage,
    InvitationStorage, WorkflowStorage,
};

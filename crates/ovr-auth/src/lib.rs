//! # ovr-auth
//!
//! Access control for the OVR incident workflow.
//!
//! ## Overview
//!
//! - [`visibility`]: which incidents a principal may see, as an
//!   [`IncidentFilter`](ovr_storage::IncidentFilter) plus the
//!   [`SecureDataAccess`] reader that applies it
//! - [`permission`]: whether a principal may perform a workflow action
//! - [`token`]: opaque shared-access tokens and their validation rules
//! - [`sharing`]: the invitation lifecycle and resource access checks
//! - [`config`]: sharing configuration
//!
//! Authentication itself is external. This crate receives an already
//! authenticated [`Principal`](ovr_core::Principal).

pub mod config;
pub mod permission;
pub mod sharing;
pub mod token;
pub mod visibility;

pub use config::SharingConfig;
pub use permission::{allowed_statuses, can_perform_action, validate_action};
pub use sharing::{AccessGrant, InvitationExpiry, SharedAccessManager};
pub use token::{TokenRejection, check_invitation, generate_token};
pub use visibility::{SecureDataAccess, VisibilityOptions, incident_visibility};

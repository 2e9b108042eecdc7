//! # ovr-workflow
//!
//! The OVR incident workflow engine.
//!
//! - [`payload`] validates the `data` object of each action
//! - [`handlers`] computes the single mutation an action produces
//! - [`dispatcher`] ties payload validation, loading, permission checks and
//!   persistence together
//! - [`corrective`] and [`investigation`] serve the collaborative records,
//!   which token holders can reach as well
//!
//! ```ignore
//! let dispatcher = Dispatcher::standard(storage)?;
//! let outcome = dispatcher
//!     .dispatch(&principal, 42, "qi-assign-hod", Some(&json!({"departmentHeadId": 7})))
//!     .await?;
//! ```

pub mod corrective;
pub mod dispatcher;
pub mod handlers;
pub mod investigation;
pub mod payload;

pub use corrective::{ChecklistProgress, CorrectiveActionService};
pub use dispatcher::{ActionOutcome, ActionRequest, Dispatcher};
pub use handlers::{ActionContext, ActionHandler, HandlerRegistry, Mutation};
pub use investigation::InvestigationService;
pub use payload::ActionPayload;

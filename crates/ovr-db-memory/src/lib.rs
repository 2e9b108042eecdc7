//! In-memory storage backend for the OVR workflow.
//!
//! This crate provides [`InMemoryStore`], an implementation of every trait
//! from `ovr-storage` backed by concurrent `DashMap`s. It is what the server
//! binary runs against and what the test suites use.
//!
//! # Example
//!
//! ```ignore
//! use ovr_core::NewIncident;
//! use ovr_db_memory::InMemoryStore;
//! use ovr_storage::IncidentStorage;
//!
//! let store = InMemoryStore::new();
//! let incident = store.create_incident(NewIncident::submitted(3)).await?;
//! ```

mod store;

pub use ovr_storage::{StorageError, StorageResult, WorkflowStorage};
pub use store::InMemoryStore;

/// Type alias for a shareable storage instance.
pub type DynWorkflowStorage = std::sync::Arc<dyn WorkflowStorage>;

/// Creates a new in-memory storage instance.
pub fn create_storage() -> DynWorkflowStorage {
    std::sync::Arc::new(InMemoryStore::new())
}

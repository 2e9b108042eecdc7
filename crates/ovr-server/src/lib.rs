pub mod bootstrap;
pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::AppConfig;
pub use error::{ApiError, ApiResult};
pub use extract::Caller;
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, OvrServer, ServerBuilder, build_app};

//! Log output for the server binary.
//!
//! Logging starts at `info` before the config file is read. The filter sits
//! behind a reload layer so `logging.level` can replace it afterwards.
//! `RUST_LOG` overrides both.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, filter::ParseError, fmt, prelude::*, reload};

type FilterHandle = reload::Handle<EnvFilter, Registry>;

static FILTER_HANDLE: OnceLock<FilterHandle> = OnceLock::new();

const STARTUP_LEVEL: &str = "info";

/// Filter for a configured level. Request spans from `tower_http` follow
/// the same level.
pub fn level_filter(level: &str) -> Result<EnvFilter, ParseError> {
    let level = level.trim().to_ascii_lowercase();
    EnvFilter::try_new(format!("{level},tower_http={level}"))
}

fn env_override() -> Option<EnvFilter> {
    std::env::var_os(EnvFilter::DEFAULT_ENV)?;
    EnvFilter::try_from_default_env().ok()
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_tracing() {
    let filter = env_override().unwrap_or_else(|| EnvFilter::new(STARTUP_LEVEL));
    let (filter_layer, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter_layer)
        .with(fmt::layer().with_target(true))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
}

/// Switches to the configured level. Does nothing when `RUST_LOG` is set
/// or no subscriber was installed.
pub fn apply_logging_level(level: &str) -> Result<(), String> {
    if std::env::var_os(EnvFilter::DEFAULT_ENV).is_some() {
        return Ok(());
    }
    let Some(handle) = FILTER_HANDLE.get() else {
        return Ok(());
    };
    let filter =
        level_filter(level).map_err(|e| format!("invalid logging level {level:?}: {e}"))?;
    handle
        .reload(filter)
        .map_err(|e| format!("failed to apply logging level: {e}"))
}

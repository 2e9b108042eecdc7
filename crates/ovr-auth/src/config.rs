//! Shared-access configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Smallest accepted token length in bytes.
pub const MIN_TOKEN_BYTES: usize = 16;
/// Largest accepted token length in bytes.
pub const MAX_TOKEN_BYTES: usize = 64;

/// Settings for invitation tokens.
///
/// # Example (TOML)
///
/// ```toml
/// [sharing]
/// default_expiration = "30days"
/// token_bytes = 32
/// allow_never_expiring = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SharingConfig {
    /// Lifetime of an invitation created without an explicit expiry.
    #[serde(with = "humantime_serde")]
    pub default_expiration: Duration,

    /// Number of random bytes per token. The token is their hex encoding.
    pub token_bytes: usize,

    /// Whether inviters may create invitations that never expire.
    pub allow_never_expiring: bool,
}

impl Default for SharingConfig {
    fn default() -> Self {
        Self {
            default_expiration: Duration::from_secs(30 * 24 * 3600), // 30 days
            token_bytes: 32,
            allow_never_expiring: true,
        }
    }
}

impl SharingConfig {
    /// Checks the configured values.
    pub fn validate(&self) -> Result<(), String> {
        if !(MIN_TOKEN_BYTES..=MAX_TOKEN_BYTES).contains(&self.token_bytes) {
            return Err(format!(
                "sharing.token_bytes must be between {MIN_TOKEN_BYTES} and {MAX_TOKEN_BYTES}, got {}",
                self.token_bytes
            ));
        }
        if self.default_expiration.is_zero() {
            return Err("sharing.default_expiration must be positive".to_string());
        }
        Ok(())
    }

    /// The default lifetime as a `time` duration.
    #[must_use]
    pub fn default_lifetime(&self) -> time::Duration {
        time::Duration::try_from(self.default_expiration).unwrap_or(time::Duration::MAX)
    }
}

//! # Invalidator Configuration
//!
//! Layered configuration for the rowcache invalidator: built-in defaults, an
//! optional TOML file, then `ROWCACHE_*` environment variables.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use rowcache_invalidator::config::ConfigLoader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConfigLoader::load()?;
//! println!("invalidating rowcache for {}", config.db_name);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigLoader;

use crate::constants::DEFAULT_RETRY_DELAY_MS;

/// Root configuration for a `RowcacheInvalidator`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct InvalidatorConfig {
    /// Database served by this instance. Fallback statements qualified with
    /// any other schema are ignored.
    pub db_name: String,

    /// Delay between a failed stream attempt and the next reconnect
    pub retry_delay_ms: u64,

    /// Spawn a source health check when a stream fails with a connectivity error
    pub health_check_on_connection_error: bool,

    /// Prefix applied to published stat names
    pub stats_prefix: String,

    /// Whether the host should publish state/position/lag stats
    pub publish_stats: bool,
}

impl Default for InvalidatorConfig {
    fn default() -> Self {
        Self {
            db_name: String::new(),
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            health_check_on_connection_error: true,
            stats_prefix: String::new(),
            publish_stats: true,
        }
    }
}

impl InvalidatorConfig {
    /// Default configuration for the given database
    pub fn new(db_name: impl Into<String>) -> Self {
        Self {
            db_name: db_name.into(),
            ..Self::default()
        }
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Name under which a stat is published, honoring `stats_prefix`
    pub fn stat_name(&self, name: &str) -> String {
        format!("{}{}", self.stats_prefix, name)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.db_name.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field(
                "db_name",
                "invalidator configuration",
            ));
        }

        if self.retry_delay_ms == 0 {
            return Err(ConfigurationError::invalid_value(
                "retry_delay_ms",
                "0",
                "retry delay must be greater than zero",
            ));
        }

        Ok(())
    }
}

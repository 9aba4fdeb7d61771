//! Configuration Loader
//!
//! Builds an [`InvalidatorConfig`] from three layers, later layers winning:
//! 0. Built-in defaults
//! 1. An optional TOML file (explicit path, or `ROWCACHE_CONFIG_PATH`)
//! 2. `ROWCACHE_*` environment variables (`ROWCACHE_DB_NAME`, `ROWCACHE_RETRY_DELAY_MS`, ...)
//!
//! The merged result is validated before it is returned.

use super::error::{ConfigResult, ConfigurationError};
use super::InvalidatorConfig;
use config::{Config, Environment, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "ROWCACHE_CONFIG_PATH";

/// Prefix for environment overrides
pub const ENV_PREFIX: &str = "ROWCACHE";

/// Zero-state utility struct providing static configuration loading functions.
#[derive(Debug)]
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration, reading the file named by `ROWCACHE_CONFIG_PATH` if set
    pub fn load() -> ConfigResult<InvalidatorConfig> {
        let path = std::env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from);
        Self::load_layers(path.as_deref(), true)
    }

    /// Load configuration from a specific TOML file plus environment overrides
    pub fn load_from_path(path: &Path) -> ConfigResult<InvalidatorConfig> {
        Self::load_layers(Some(path), true)
    }

    /// Load configuration from a specific TOML file without consulting the environment
    ///
    /// Useful for tests, which must not depend on process-global variables.
    pub fn load_file_only(path: &Path) -> ConfigResult<InvalidatorConfig> {
        Self::load_layers(Some(path), false)
    }

    /// Load configuration from an in-memory TOML document
    pub fn load_from_str(toml: &str) -> ConfigResult<InvalidatorConfig> {
        let config = Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()
            .map_err(|e| ConfigurationError::load_error("inline TOML", e))?;

        Self::finish(config, "inline TOML")
    }

    fn load_layers(path: Option<&Path>, include_env: bool) -> ConfigResult<InvalidatorConfig> {
        let mut builder = Self::defaults()?;

        let source_name = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading invalidator configuration file");
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
                path.display().to_string()
            }
            None => "defaults".to_string(),
        };

        if include_env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder
            .build()
            .map_err(|e| ConfigurationError::load_error(source_name.clone(), e))?;

        Self::finish(config, &source_name)
    }

    fn defaults() -> ConfigResult<config::ConfigBuilder<config::builder::DefaultState>> {
        let defaults = InvalidatorConfig::default();
        Config::builder()
            .set_default("db_name", defaults.db_name)
            .and_then(|b| b.set_default("retry_delay_ms", defaults.retry_delay_ms))
            .and_then(|b| {
                b.set_default(
                    "health_check_on_connection_error",
                    defaults.health_check_on_connection_error,
                )
            })
            .and_then(|b| b.set_default("stats_prefix", defaults.stats_prefix))
            .and_then(|b| b.set_default("publish_stats", defaults.publish_stats))
            .map_err(|e| ConfigurationError::load_error("defaults", e))
    }

    fn finish(config: Config, source_name: &str) -> ConfigResult<InvalidatorConfig> {
        let config: InvalidatorConfig = config
            .try_deserialize()
            .map_err(|e| ConfigurationError::load_error(source_name, e))?;

        config.validate()?;

        debug!(
            source = %source_name,
            db_name = %config.db_name,
            retry_delay_ms = config.retry_delay_ms,
            health_check_on_connection_error = config.health_check_on_connection_error,
            publish_stats = config.publish_stats,
            "Invalidator configuration loaded"
        );

        Ok(config)
    }
}

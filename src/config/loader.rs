//!
//! Configuration loading system for Transcript Guard.
//!
//! Builds configuration from multiple layers in precedence order:
//! 1. Environment variables (highest priority)
//! 2. Explicit config file
//! 3. User config file (~/.config/transcript-guard/config.toml)
//! 4. System config file (/etc/transcript-guard/config.toml)
//! 5. Built-in defaults (lowest priority)
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::paths;
use crate::config::{Config, LogLevel, SanitizerConfig, ServerConfig};
use crate::error::{GuardError, Result};

use std::collections::BTreeMap;
use std::env;
use std::path::Path;

/* --- constants ------------------------------------------------------------------------------ */

/** Prefix shared by every configuration environment variable */
pub const ENV_PREFIX: &str = "TRANSCRIPT_GUARD_";

/** Environment variable naming an explicit configuration file */
pub const CONFIG_PATH_ENV: &str = "TRANSCRIPT_GUARD_CONFIG";

/* --- types ----------------------------------------------------------------------------------- */

///
/// Configuration loader implementing the Builder pattern.
///
/// Each `with_*` method layers one source over the configuration built so far.
pub struct ConfigLoader {
    /// Current configuration being built
    config: Config,
    /// Environment variable overrides collected
    env_overrides: BTreeMap<String, String>,
    /// Whether defaults have been applied
    defaults_applied: bool,
}

/* --- implementations --------------------------------------------------------------------- */

impl ConfigLoader {
    /// Create a new configuration loader
    ///
    /// # Examples
    /// ```rust,no_run
    /// use transcript_guard::config::loader::ConfigLoader;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ConfigLoader::new()
    ///     .with_defaults()
    ///     .with_user_config()?
    ///     .with_env_vars()?
    ///     .build()?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn new() -> Self {
        Self { config: Config::default(), env_overrides: BTreeMap::new(), defaults_applied: false }
    }

    /// Apply built-in default values
    pub fn with_defaults(mut self) -> Self {
        self.config = Config::default();
        self.defaults_applied = true;
        self
    }

    /// Load the system-wide configuration file, if it exists
    pub fn with_system_config(mut self) -> Result<Self> {
        self.load_if_present(&paths::system_config_file()?, "system")?;
        Ok(self)
    }

    /// Load the user configuration file, if it exists
    pub fn with_user_config(mut self) -> Result<Self> {
        self.load_if_present(&paths::user_config_file()?, "user")?;
        Ok(self)
    }

    /// Load configuration from a specific file path, which must exist
    pub fn with_config_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!("Loading custom config from: {}", path.display());
        self.load_config_file(path)?;
        Ok(self)
    }

    /// Apply environment variable overrides
    ///
    /// Supported environment variables:
    /// - TRANSCRIPT_GUARD_SERVER_HOST
    /// - TRANSCRIPT_GUARD_SERVER_PORT
    /// - TRANSCRIPT_GUARD_SERVER_LOG_LEVEL
    /// - TRANSCRIPT_GUARD_SERVER_MAX_BODY_BYTES
    /// - TRANSCRIPT_GUARD_SANITIZER_WARN_ON_DROP
    ///
    /// # Returns
    /// * `Ok(Self)` - Environment variables applied
    /// * `Err(GuardError)` - Invalid environment variable values
    pub fn with_env_vars(mut self) -> Result<Self> {
        tracing::debug!("Loading configuration from environment variables");

        self.env_overrides.extend(env::vars().filter(|(key, _)| key.starts_with(ENV_PREFIX)));
        self.apply_env_overrides()?;

        Ok(self)
    }

    /// Validate and return the final configuration
    pub fn build(self) -> Result<Config> {
        if !self.defaults_applied {
            return Err(GuardError::Config(
                "Configuration loader must call with_defaults() before build()".to_string(),
            ));
        }

        self.config.validate()?;

        tracing::debug!(
            "Final config: server={}:{}, log_level={:?}, max_body_bytes={}, warn_on_drop={}",
            self.config.server.host,
            self.config.server.port,
            self.config.server.log_level,
            self.config.server.max_body_bytes,
            self.config.sanitizer.warn_on_drop
        );

        Ok(self.config)
    }

    /* --- private methods ----------------------------------------------------------------- */

    /// Optional layer: a missing file is skipped, an unreadable or invalid one fails
    fn load_if_present(&mut self, path: &Path, scope: &str) -> Result<()> {
        if !path.exists() {
            tracing::debug!(scope, path = %path.display(), "No config file in layer");
            return Ok(());
        }

        tracing::debug!(scope, path = %path.display(), "Loading config layer");
        self.load_config_file(path)
    }

    /// Load and merge configuration from a TOML file
    fn load_config_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();

        paths::validate_config_file(path)?;

        let contents = std::fs::read_to_string(path).map_err(|e| {
            GuardError::Config(format!(
                "Failed to read configuration file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let file_config: Config = toml::from_str(&contents).map_err(|e| {
            GuardError::Config(format!(
                "Failed to parse TOML configuration file '{}': {}\n\
                 \n\
                 Run 'transcript-guard validate' for more details.",
                path.display(),
                e
            ))
        })?;

        self.merge_config(file_config);

        tracing::debug!("Successfully loaded config from: {}", path.display());
        Ok(())
    }

    /// Merge another config into the current config; values equal to the default are
    /// treated as unset
    fn merge_config(&mut self, other: Config) {
        self.merge_server_config(other.server);
        self.merge_sanitizer_config(other.sanitizer);
    }

    fn merge_server_config(&mut self, other: ServerConfig) {
        let defaults = ServerConfig::default();

        if other.host != defaults.host {
            self.config.server.host = other.host;
        }
        if other.port != defaults.port {
            self.config.server.port = other.port;
        }
        if other.log_level != defaults.log_level {
            self.config.server.log_level = other.log_level;
        }
        if other.max_body_bytes != defaults.max_body_bytes {
            self.config.server.max_body_bytes = other.max_body_bytes;
        }
    }

    fn merge_sanitizer_config(&mut self, other: SanitizerConfig) {
        if other.warn_on_drop != SanitizerConfig::default().warn_on_drop {
            self.config.sanitizer.warn_on_drop = other.warn_on_drop;
        }
    }

    /// Apply environment variable overrides to current configuration
    fn apply_env_overrides(&mut self) -> Result<()> {
        for (key, value) in &self.env_overrides {
            match key.as_str() {
                "TRANSCRIPT_GUARD_SERVER_HOST" => {
                    self.config.server.host = value.trim().to_string();
                }
                "TRANSCRIPT_GUARD_SERVER_PORT" => {
                    self.config.server.port = value.trim().parse().map_err(|e| {
                        GuardError::Config(format!(
                            "Invalid TRANSCRIPT_GUARD_SERVER_PORT value '{}': {}\n\
                             Port must be a number between 1 and 65535.",
                            value, e
                        ))
                    })?;
                }
                "TRANSCRIPT_GUARD_SERVER_LOG_LEVEL" => {
                    self.config.server.log_level = LogLevel::parse(value)?;
                }
                "TRANSCRIPT_GUARD_SERVER_MAX_BODY_BYTES" => {
                    self.config.server.max_body_bytes = value.trim().parse().map_err(|e| {
                        GuardError::Config(format!(
                            "Invalid TRANSCRIPT_GUARD_SERVER_MAX_BODY_BYTES value '{}': {}",
                            value, e
                        ))
                    })?;
                }
                "TRANSCRIPT_GUARD_SANITIZER_WARN_ON_DROP" => {
                    self.config.sanitizer.warn_on_drop = parse_bool_env(value, key)?;
                }
                CONFIG_PATH_ENV => {}
                _ => {
                    tracing::debug!("Ignoring unknown environment variable: {}", key);
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/* --- utility functions ------------------------------------------------------------------- */

/// Parse boolean value from environment variable
fn parse_bool_env(value: &str, var_name: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "1" | "on" | "enabled" => Ok(true),
        "false" | "no" | "0" | "off" | "disabled" => Ok(false),
        _ => Err(GuardError::Config(format!(
            "Invalid boolean value for {}: '{}'\n\
             Valid values: true/false, yes/no, 1/0, on/off, enabled/disabled",
            var_name, value
        ))),
    }
}

/* --- tests ------------------------------------------------------------------------------- */

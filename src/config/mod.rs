//!
//! Configuration management for Transcript Guard.
//!
//! Layered configuration with TOML files in platform-native directories:
//! environment variables > explicit config file > user config > system config > defaults.
//!
//! - `loader.rs` - configuration loading and layer merging
//! - `paths.rs` - platform-native path resolution
//! - `validation.rs` - configuration validation
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- modules --------------------------------------------------------------------------------- */

pub mod loader;
pub mod paths;
pub mod validation;

/* --- uses ------------------------------------------------------------------------------------ */

use crate::error::{GuardError, Result};
use serde::{Deserialize, Serialize};

/* --- types ----------------------------------------------------------------------------------- */

///
/// Main application configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Sanitizer reporting configuration
    #[serde(default)]
    pub sanitizer: SanitizerConfig,
}

///
/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,
    /// HTTP server port number
    #[serde(default = "default_port")]
    pub port: u16,
    /// Application logging level
    #[serde(default = "default_log_level")]
    pub log_level: LogLevel,
    /// Largest accepted request body in bytes
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

///
/// Sanitizer reporting configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SanitizerConfig {
    /// Report non-zero drop counts at warn level instead of debug
    #[serde(default = "default_warn_on_drop")]
    pub warn_on_drop: bool,
}

///
/// Logging level enumeration.
///
/// Defines available log levels compatible with tracing crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/* --- defaults -------------------------------------------------------------------------------- */

/// Default bind address
fn default_host() -> String {
    "127.0.0.1".to_string()
}

/// Default HTTP port
fn default_port() -> u16 {
    3000
}

/// Default logging level
fn default_log_level() -> LogLevel {
    LogLevel::Info
}

/// Default body limit (2 MiB)
fn default_max_body_bytes() -> usize {
    2 * 1024 * 1024
}

fn default_warn_on_drop() -> bool {
    true
}

/* --- implementations --------------------------------------------------------------------- */

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self { warn_on_drop: default_warn_on_drop() }
    }
}

impl Config {
    /// Load configuration from the standard hierarchy:
    /// 1. Environment variables (highest priority)
    /// 2. Explicit config file (`TRANSCRIPT_GUARD_CONFIG`)
    /// 3. User config file (~/.config/transcript-guard/config.toml)
    /// 4. System config file (/etc/transcript-guard/config.toml)
    /// 5. Built-in defaults (lowest priority)
    ///
    /// A `.env` file in the working directory is loaded first, if present.
    ///
    /// # Returns
    /// * `Ok(Config)` - Successfully loaded and validated configuration
    /// * `Err(GuardError)` - Configuration loading or validation failed
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut builder =
            loader::ConfigLoader::new().with_defaults().with_system_config()?.with_user_config()?;
        if let Ok(explicit) = std::env::var(loader::CONFIG_PATH_ENV) {
            builder = builder.with_config_file(paths::expand_path(&explicit)?)?;
        }

        builder.with_env_vars()?.build()
    }

    /// Validate the current configuration
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is valid
    /// * `Err(GuardError)` - Configuration validation failed with details
    pub fn validate(&self) -> Result<()> {
        validation::ConfigValidator::new(self).validate()
    }

    /// Address string the HTTP server binds to
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Get configuration file example as TOML string
    pub fn example_toml() -> &'static str {
        r#"# Transcript Guard Configuration
# This file should be placed at:
#   Linux/Unix: ~/.config/transcript-guard/config.toml
#   macOS: ~/Library/Application Support/transcript-guard/config.toml
#   Windows: %APPDATA%/transcript-guard/config.toml

[server]
# Interface to bind (default: 127.0.0.1)
host = "127.0.0.1"

# HTTP server port (default: 3000)
port = 3000

# Logging level: trace, debug, info, warn, error (default: info)
log_level = "info"

# Largest accepted request body in bytes (default: 2097152)
max_body_bytes = 2097152

[sanitizer]
# Log dropped tool_result counts at warn level; debug otherwise (default: true)
warn_on_drop = true
"#
    }
}

impl LogLevel {
    /// Directive string for an `EnvFilter`
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(GuardError::Config(format!(
                "Invalid log level '{}'. Valid levels are: trace, debug, info, warn, error",
                s
            ))),
        }
    }
}

/* --- tests ------------------------------------------------------------------------------- */

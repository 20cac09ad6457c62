//!
//! Configuration validation for Transcript Guard.
//!
//! Collects every error and warning before reporting, so a single run shows all
//! problems at once. Warnings are logged; errors fail validation.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use crate::config::{Config, LogLevel};
use crate::error::{GuardError, Result};

/* --- constants ------------------------------------------------------------------------------ */

/** Body limit above which a warning is reported (64 MiB) */
const LARGE_BODY_LIMIT: usize = 64 * 1024 * 1024;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Configuration validator.
pub struct ConfigValidator<'a> {
    /// Configuration to validate
    config: &'a Config,
    /// Validation errors collected during validation
    errors: Vec<String>,
    /// Validation warnings collected during validation
    warnings: Vec<String>,
}

/* --- implementations --------------------------------------------------------------------- */

impl<'a> ConfigValidator<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config, errors: Vec::new(), warnings: Vec::new() }
    }

    /// Perform configuration validation
    ///
    /// # Returns
    /// * `Ok(())` - Configuration is valid (warnings are logged)
    /// * `Err(GuardError)` - Configuration validation failed with every error found
    pub fn validate(mut self) -> Result<()> {
        self.validate_server_config();
        self.validate_logging();

        for warning in &self.warnings {
            tracing::warn!("Configuration warning: {}", warning);
        }

        if !self.errors.is_empty() {
            let error_msg = format!(
                "Configuration validation failed with {} error(s):\n\n{}",
                self.errors.len(),
                self.errors
                    .iter()
                    .enumerate()
                    .map(|(i, e)| format!("{}. {}", i + 1, e))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            return Err(GuardError::Config(error_msg));
        }

        tracing::debug!("Configuration validation passed with {} warning(s)", self.warnings.len());
        Ok(())
    }

    /// Warnings gathered so far; useful to callers that render a report
    pub fn warnings(mut self) -> Vec<String> {
        self.validate_server_config();
        self.validate_logging();
        self.warnings
    }

    /* --- private validation methods ------------------------------------------------------ */

    fn validate_server_config(&mut self) {
        let config = self.config;
        let server = &config.server;

        if server.host.trim().is_empty() {
            self.add_error("Server host cannot be empty".to_string());
        }

        if server.port == 0 {
            self.add_error(format!(
                "Invalid server port {}: must be between 1 and 65535",
                server.port
            ));
        } else if server.port < 1024 {
            self.add_warning(format!(
                "Server port {} requires root/administrator privileges",
                server.port
            ));
        }

        if server.max_body_bytes == 0 {
            self.add_error("Request body limit cannot be zero".to_string());
        } else if server.max_body_bytes > LARGE_BODY_LIMIT {
            self.add_warning(format!(
                "Request body limit of {} bytes is unusually large for chat transcripts",
                server.max_body_bytes
            ));
        }
    }

    fn validate_logging(&mut self) {
        if self.config.server.log_level == LogLevel::Trace {
            self.add_warning(
                "Trace log level enabled: tool ids of dropped blocks will be logged".to_string(),
            );
        }
    }

    fn add_error(&mut self, error: String) {
        tracing::debug!("Validation error: {}", error);
        self.errors.push(error);
    }

    fn add_warning(&mut self, warning: String) {
        tracing::debug!("Validation warning: {}", warning);
        self.warnings.push(warning);
    }
}

/* --- tests ------------------------------------------------------------------------------- */

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes_validation() {
        let config = Config::default();
        assert!(ConfigValidator::new(&config).validate().is_ok());
    }

    #[test]
    fn test_invalid_port_fails_validation() {
        let mut config = Config::default();
        config.server.port = 0;

        let result = ConfigValidator::new(&config).validate();
        let error_msg = format!("{}", result.unwrap_err());
        assert!(error_msg.contains("Invalid server port 0"));
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = Config::default();
        config.server.port = 0;
        config.server.max_body_bytes = 0;
        config.server.host = "  ".to_string();

        let error_msg = ConfigValidator::new(&config).validate().unwrap_err().to_string();
        assert!(error_msg.contains("3 error(s)"));
        assert!(error_msg.contains("body limit cannot be zero"));
    }

    #[test]
    fn test_privileged_port_is_only_a_warning() {
        let mut config = Config::default();
        config.server.port = 80;

        assert!(ConfigValidator::new(&config).validate().is_ok());
        let warnings = ConfigValidator::new(&config).warnings();
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("privileges"));
    }

    #[test]
    fn test_large_body_limit_warning() {
        let mut config = Config::default();
        config.server.max_body_bytes = LARGE_BODY_LIMIT + 1;
        config.server.log_level = LogLevel::Trace;

        assert_eq!(ConfigValidator::new(&config).warnings().len(), 2);
    }
}

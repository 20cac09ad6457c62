//!
//! Error handling for the transcript guard.
//!
//! The protocol layer is total and never fails; only the outer layers (configuration,
//! file I/O, and the agent request contract) produce errors. All of them funnel into
//! [`GuardError`] through thiserror.
//!
//! Authors:
//!   Jaro <yarenty@gmail.com>
//!
//! Copyright (c) 2026 SkyCorp

/* --- uses ------------------------------------------------------------------------------------ */

use thiserror::Error;

use crate::contract::ContractError;

/* --- types ----------------------------------------------------------------------------------- */

///
/// Application error types.
///
/// Covers configuration loading, server startup, transcript file access, JSON
/// parsing and agent request contract violations.
#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Contract(#[from] ContractError),
}

/* --- start of code -------------------------------------------------------------------------- */

/// Result type alias for cleaner error handling throughout the application
pub type Result<T> = std::result::Result<T, GuardError>;

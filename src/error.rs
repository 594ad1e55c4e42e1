//! Error types for figma-mcp.
//!
//! # Security Note
//!
//! Error messages never include credentials. Variants that concern the
//! Figma token describe the problem without echoing the value.

use std::path::PathBuf;

use thiserror::Error;

use crate::figma::FigmaError;

/// Errors that can occur during configuration operations.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file could not be read.
    #[error("failed to read configuration file: {path}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration file could not be parsed.
    #[error("failed to parse configuration file: {path}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },

    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    NotFound {
        /// Path where the configuration file was expected.
        path: PathBuf,
    },

    /// No usable Figma credentials for the selected authentication mode.
    #[error("missing Figma credentials: {message}")]
    MissingCredentials {
        /// Which credential is missing.
        message: String,
    },

    /// Configuration validation failed.
    #[error("configuration validation failed: {message}")]
    ValidationError {
        /// Description of the validation failure.
        message: String,
    },
}

/// Errors returned by tool handlers.
///
/// The registry renders these into error results; they never abort the
/// server.
#[derive(Error, Debug)]
pub enum ToolError {
    /// The caller supplied missing or malformed arguments.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The Figma API call failed.
    #[error(transparent)]
    Figma(#[from] FigmaError),

    /// The result could not be serialised.
    #[error("Failed to serialise result: {0}")]
    Serialize(String),
}

impl ToolError {
    /// Creates an invalid argument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

//! Error types for the harness
//!
//! Terminal errors carry the original diagnostic text from the provisioning
//! tool so a failed scenario can be debugged from the report alone.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the harness
#[derive(Error, Debug)]
pub enum Error {
    // === Provisioning Errors ===
    #[error("Provisioning command failed with exit code {status:?}:\n{output}")]
    PermanentProvisioning {
        output: String,
        status: Option<i32>,
    },

    #[error("Provisioning binary '{name}' not found in PATH. Install it or set 'binary' in the config file")]
    BinaryNotFound { name: String },

    // === Output Errors ===
    #[error("Output '{name}' not found in the workspace outputs")]
    OutputNotFound { name: String },

    #[error("Output '{name}' is not a {expected}")]
    UnexpectedOutputType {
        name: String,
        expected: &'static str,
    },

    // === Assertion Errors ===
    #[error("Output mismatch:\n  actual:   {actual}\n  expected: {expected}")]
    AssertionMismatch { actual: String, expected: String },

    // === Retry Policy Errors ===
    #[error("Invalid retry signature pattern '{pattern}': {reason}")]
    InvalidRetryPattern { pattern: String, reason: String },

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === Scenario Errors ===
    #[error("Scenario error: {0}")]
    Scenario(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create an invalid retry pattern error from a regex compile failure
    pub fn invalid_retry_pattern(pattern: &str, err: &regex::Error) -> Self {
        Self::InvalidRetryPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    }
}

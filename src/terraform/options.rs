//! Invocation options for the provisioning tool

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::retry::RetryPolicy;

/// Name of the provisioning binary looked up in PATH when no override is set
pub const DEFAULT_BINARY: &str = "terraform";

/// Known-transient failures of `init` in CI: plugin fetches fail for network
/// reasons and succeed after a few retries
pub const DEFAULT_RETRYABLE_ERRORS: &[(&str, &str)] = &[
    (
        ".*unable to verify signature.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*unable to verify checksum.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*no provider exists with the given name.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*registry service is unreachable.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
    (
        ".*connection reset by peer.*",
        "Failed to retrieve plugin due to transient network error.",
    ),
];

/// Options for one scenario's provisioning commands
///
/// Constructed once per scenario and immutable thereafter; the retry loop
/// re-invokes commands with identical options.
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory containing the infrastructure definition
    pub terraform_dir: PathBuf,

    /// Variables passed as `-var name=value` (composites serialize as JSON)
    pub vars: BTreeMap<String, serde_json::Value>,

    /// Variable files passed as `-var-file`
    pub var_files: Vec<PathBuf>,

    /// Environment variables set for every invocation
    pub env_vars: BTreeMap<String, String>,

    /// Disable colored tool output so captured text is parseable
    pub no_color: bool,

    /// Retry signatures: pattern -> human-readable reason
    pub retryable_errors: BTreeMap<String, String>,

    /// Additional attempts after the first
    pub max_retries: u32,

    /// Delay before each retry attempt
    pub time_between_retries: Duration,

    /// Override for the provisioning binary (default: `terraform` from PATH)
    pub binary: Option<PathBuf>,
}

impl Options {
    /// Options with no automatic retries
    pub fn new(terraform_dir: impl Into<PathBuf>) -> Self {
        Self {
            terraform_dir: terraform_dir.into(),
            vars: BTreeMap::new(),
            var_files: Vec::new(),
            env_vars: BTreeMap::new(),
            no_color: true,
            retryable_errors: BTreeMap::new(),
            max_retries: 0,
            time_between_retries: Duration::from_secs(5),
            binary: None,
        }
    }

    /// Add the default transient-init signatures with a retry budget of 3
    /// attempts, 5 seconds apart
    pub fn with_default_retryable_errors(mut self) -> Self {
        for (pattern, reason) in DEFAULT_RETRYABLE_ERRORS {
            self.retryable_errors
                .insert((*pattern).to_string(), (*reason).to_string());
        }
        if self.max_retries == 0 {
            self.max_retries = 3;
        }
        self
    }

    /// Merge config-file defaults into unset fields
    ///
    /// Explicitly set options always win; config signatures are added to the
    /// scenario's own.
    pub fn with_config_defaults(mut self, config: &Config) -> Self {
        if self.max_retries == 0 {
            self.max_retries = config.retry.max_retries;
            self.time_between_retries = Duration::from_secs(config.retry.delay_secs);
        }
        for (pattern, reason) in &config.signatures {
            self.retryable_errors
                .entry(pattern.clone())
                .or_insert_with(|| reason.clone());
        }
        if self.binary.is_none() {
            self.binary = config.binary.clone();
        }
        self
    }

    /// Set a variable
    pub fn var(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.vars.insert(name.to_string(), value.into());
        self
    }

    /// Compile the retry policy from the configured signatures
    pub fn retry_policy(&self) -> Result<RetryPolicy> {
        RetryPolicy::new(
            &self.retryable_errors,
            self.max_retries,
            self.time_between_retries,
        )
    }

    /// Resolve the provisioning binary, via the override or PATH lookup
    pub fn resolve_binary(&self) -> Result<PathBuf> {
        if let Some(binary) = &self.binary {
            return Ok(binary.clone());
        }
        which::which(DEFAULT_BINARY).map_err(|_| Error::BinaryNotFound {
            name: DEFAULT_BINARY.to_string(),
        })
    }
}

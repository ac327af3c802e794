//! Scenario configuration types
//!
//! Defines the data structures for deserializing YAML test scenarios.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A complete test scenario loaded from a YAML file
#[derive(Deserialize, Debug)]
pub struct ScenarioConfig {
    /// Name of the scenario
    pub name: String,
    /// Optional description of what the scenario verifies
    pub description: Option<String>,
    /// Provisioning target configuration
    pub terraform: TargetConfig,
    /// Retry settings for the provisioning commands
    #[serde(default)]
    pub retry: RetryConfig,
    /// Output assertions evaluated after apply
    pub outputs: Vec<OutputAssertion>,
}

/// Configuration for the provisioning target
#[derive(Deserialize, Debug)]
pub struct TargetConfig {
    /// Directory with the infrastructure definition (relative to the
    /// scenario file)
    pub dir: PathBuf,
    /// Copy the definition to a temp dir before provisioning
    #[serde(default)]
    pub copy_to_temp: bool,
    /// Variables passed as `-var`
    #[serde(default)]
    pub vars: BTreeMap<String, serde_yaml::Value>,
    /// Variable files passed as `-var-file`
    #[serde(default)]
    pub var_files: Vec<PathBuf>,
}

/// Retry settings for a scenario
#[derive(Deserialize, Debug)]
pub struct RetryConfig {
    /// Additional attempts after the first (0 falls back to config-file
    /// defaults)
    #[serde(default)]
    pub max_retries: u32,
    /// Seconds to sleep before each retry attempt
    pub delay_secs: Option<u64>,
    /// Extra signatures: pattern -> human-readable reason
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,
    /// Include the built-in transient-init signatures (default: true)
    #[serde(default = "default_true")]
    pub use_default_signatures: bool,
}

fn default_true() -> bool {
    true
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            delay_secs: None,
            signatures: BTreeMap::new(),
            use_default_signatures: true,
        }
    }
}

/// One output assertion
#[derive(Deserialize, Debug)]
pub struct OutputAssertion {
    /// Name of the declared output to read
    pub output: String,
    /// Expected value as an arbitrarily nested fixture
    pub equals: serde_yaml::Value,
}

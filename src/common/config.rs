//! Configuration file handling
//!
//! Config-file values are defaults only; scenario files and `Options` built
//! in test code always win over them.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

use super::paths::config_path;
use super::Result;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Default retry settings applied when a scenario omits them
    #[serde(default)]
    pub retry: RetryDefaults,

    /// Extra retry signatures merged into every policy (pattern -> reason)
    #[serde(default)]
    pub signatures: BTreeMap<String, String>,

    /// Override for the provisioning binary (default: `terraform` from PATH)
    pub binary: Option<PathBuf>,
}

/// Default retry settings in the config file
#[derive(Debug, Deserialize)]
pub struct RetryDefaults {
    /// Additional attempts after the first (0 disables retries)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Seconds to sleep before each retry attempt
    #[serde(default = "default_retry_delay")]
    pub delay_secs: u64,
}

impl Default for RetryDefaults {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            delay_secs: default_retry_delay(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    5
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path).map_err(|e| {
                    super::Error::FileRead {
                        path: path.display().to_string(),
                        error: e.to_string(),
                    }
                })?;
                return toml::from_str(&content)
                    .map_err(|e| super::Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.retry.delay_secs, 5);
        assert!(config.signatures.is_empty());
        assert!(config.binary.is_none());
    }

    #[test]
    fn test_parse_partial_config() {
        let config: Config = toml::from_str(
            r#"
            [retry]
            max_retries = 1

            [signatures]
            ".*rate limited.*" = "provider API rate limit"
            "#,
        )
        .unwrap();
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.delay_secs, 5);
        assert_eq!(
            config.signatures.get(".*rate limited.*").map(String::as_str),
            Some("provider API rate limit")
        );
    }
}

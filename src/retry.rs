//! Retry classification for transient provisioning failures
//!
//! Provisioning tools fail transiently for reasons outside the stack under
//! test (plugin registry flakiness, connection resets). A [`RetryPolicy`]
//! holds failure signatures that identify those failures from the captured
//! command output, and [`run_with_retries`] re-attempts a command while the
//! retry budget lasts. Failures that match no signature, or that outlive the
//! budget, surface the last attempt's output verbatim.

use std::collections::BTreeMap;
use std::time::Duration;

use regex::Regex;

use crate::common::{Error, Result};

/// A pattern identifying a known-transient failure, paired with a
/// human-readable reason for the retry
#[derive(Debug, Clone)]
pub struct FailureSignature {
    pattern: Regex,
    reason: String,
}

impl FailureSignature {
    /// Compile a signature from pattern text
    ///
    /// The pattern is matched unanchored against the combined stdout/stderr
    /// of a failed attempt ("contains" semantics).
    pub fn new(pattern: &str, reason: &str) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::invalid_retry_pattern(pattern, &e))?;
        Ok(Self {
            pattern,
            reason: reason.to_string(),
        })
    }

    fn matches(&self, output: &str) -> bool {
        self.pattern.is_match(output)
    }
}

/// The decision for one failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryDecision {
    /// Transient failure with budget remaining: sleep `delay`, then re-attempt
    Retry { delay: Duration, reason: String },
    /// Permanent failure or exhausted budget: surface the failure now
    Fail,
}

/// Immutable retry configuration for one scenario
///
/// The policy itself is stateless; attempt counts are tracked by the retry
/// loop, so a policy can be shared by every command a scenario runs.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    signatures: Vec<FailureSignature>,
    max_retries: u32,
    retry_delay: Duration,
}

impl RetryPolicy {
    /// Build a policy from `pattern -> reason` pairs
    ///
    /// `max_retries` counts additional attempts after the first. An empty
    /// signature map never retries regardless of `max_retries`.
    pub fn new(
        signatures: &BTreeMap<String, String>,
        max_retries: u32,
        retry_delay: Duration,
    ) -> Result<Self> {
        let signatures = signatures
            .iter()
            .map(|(pattern, reason)| FailureSignature::new(pattern, reason))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            signatures,
            max_retries,
            retry_delay,
        })
    }

    /// A policy that never retries
    pub fn no_retries() -> Self {
        Self {
            signatures: Vec::new(),
            max_retries: 0,
            retry_delay: Duration::ZERO,
        }
    }

    /// Decide whether the failed attempt `attempt` (1-based) should be
    /// retried, given its captured output
    pub fn should_retry(&self, output: &str, attempt: u32) -> RetryDecision {
        match self.classify(output) {
            Some(reason) if attempt <= self.max_retries => RetryDecision::Retry {
                delay: self.retry_delay,
                reason: reason.to_string(),
            },
            _ => RetryDecision::Fail,
        }
    }

    /// Classify a failure as transient (returning the matched reason) or
    /// permanent. Signatures are checked in insertion order; the first match
    /// wins.
    fn classify(&self, output: &str) -> Option<&str> {
        self.signatures
            .iter()
            .find(|sig| sig.matches(output))
            .map(|sig| sig.reason.as_str())
    }
}

/// One failed command invocation: combined captured output plus exit code
#[derive(Debug, Clone)]
pub struct CommandFailure {
    pub output: String,
    pub status: Option<i32>,
}

impl CommandFailure {
    /// Convert into the terminal error surfaced to the test report
    pub fn into_error(self) -> Error {
        Error::PermanentProvisioning {
            output: self.output,
            status: self.status,
        }
    }
}

/// Run an operation with bounded retries under `policy`
///
/// Performs at most `max_retries + 1` attempts. Strictly sequential: each
/// attempt runs to completion before a retry decision is made, and the
/// inter-retry delay blocks the scenario. When the budget is exhausted the
/// *last* attempt's output is surfaced verbatim, never a synthesized
/// "max retries exceeded" message.
pub async fn run_with_retries<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, CommandFailure>>,
{
    let mut attempt: u32 = 1;
    loop {
        tracing::debug!(attempt, "running provisioning command");
        match operation().await {
            Ok(value) => return Ok(value),
            Err(failure) => match policy.should_retry(&failure.output, attempt) {
                RetryDecision::Retry { delay, reason } => {
                    tracing::warn!(
                        attempt,
                        delay_secs = delay.as_secs_f64(),
                        %reason,
                        "transient provisioning failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                RetryDecision::Fail => return Err(failure.into_error()),
            },
        }
    }
}

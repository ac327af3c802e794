//! stacktest - Acceptance-test harness for infrastructure-as-code stacks
//!
//! Provisions a stack with a Terraform-compatible CLI, reads back its
//! declared outputs, and asserts them against expected fixtures, retrying
//! known-transient provisioning failures.

pub mod assert;
pub mod cli;
pub mod commands;
pub mod common;
pub mod output;
pub mod retry;
pub mod scenario;
pub mod terraform;

// Re-export commonly used types for test code
pub use assert::{assert_outputs_equal, deep_equal};
pub use common::{Error, Result};
pub use output::OutputValue;
pub use retry::{run_with_retries, RetryDecision, RetryPolicy};
pub use terraform::{Options, Workspace};

//! YAML scenario runner
//!
//! Reads scenario files describing an infrastructure directory, variables,
//! retry settings and expected outputs, then provisions, asserts and tears
//! down. Assertions go through the structural comparator rather than string
//! matching against tool output.

mod config;
mod runner;

pub use config::*;
pub use runner::{run_scenario, ScenarioResult};

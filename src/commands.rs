//! CLI command definitions
//!
//! Defines the clap commands for the harness CLI.

use clap::Subcommand;
use std::path::PathBuf;

#[derive(Subcommand)]
pub enum Commands {
    /// Run one or more scenario files
    Run {
        /// Paths to YAML scenario files
        scenarios: Vec<PathBuf>,

        /// Print provisioning details while running
        #[arg(long, short)]
        verbose: bool,

        /// Run scenarios one at a time instead of in parallel
        #[arg(long)]
        sequential: bool,
    },

    /// Print the effective retry defaults
    Defaults,
}

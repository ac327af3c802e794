//! CLI command handling
//!
//! Dispatches CLI commands and formats the run summary. Scenarios are
//! independent units of work: each owns its workspace and retry policy, so
//! they run in parallel by default.

use std::path::PathBuf;

use colored::Colorize;
use tokio::task::JoinSet;

use crate::commands::Commands;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::scenario::{self, ScenarioResult};
use crate::terraform::DEFAULT_RETRYABLE_ERRORS;

/// Dispatch a CLI command
pub async fn dispatch(command: Commands) -> Result<()> {
    match command {
        Commands::Run {
            scenarios,
            verbose,
            sequential,
        } => run_scenarios(scenarios, verbose, sequential).await,
        Commands::Defaults => print_defaults(),
    }
}

async fn run_scenarios(paths: Vec<PathBuf>, verbose: bool, sequential: bool) -> Result<()> {
    if paths.is_empty() {
        return Err(Error::Config(
            "No scenario files given. Usage: stacktest run <scenario.yaml>...".to_string(),
        ));
    }

    let total = paths.len();
    let mut results: Vec<ScenarioResult> = Vec::with_capacity(total);

    if sequential {
        for path in paths {
            results.push(run_one(path, verbose).await);
        }
    } else {
        let mut set = JoinSet::new();
        for path in paths {
            set.spawn(async move { run_one(path, verbose).await });
        }
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    return Err(Error::Scenario(format!("Scenario task panicked: {e}")))
                }
            }
        }
    }

    let failed: Vec<&ScenarioResult> = results.iter().filter(|r| !r.passed).collect();

    println!("\n{}", "Summary:".blue().bold());
    for result in &results {
        let mark = if result.passed {
            "✓".green()
        } else {
            "✗".red()
        };
        println!(
            "  {} {} ({}/{} checks)",
            mark, result.name, result.checks_run, result.checks_total
        );
        if let Some(error) = &result.error {
            println!("      {}", error.dimmed());
        }
    }

    if failed.is_empty() {
        Ok(())
    } else {
        Err(Error::Scenario(format!(
            "{} of {} scenarios failed",
            failed.len(),
            total
        )))
    }
}

/// Run one scenario, folding harness-level errors into a failed result
async fn run_one(path: PathBuf, verbose: bool) -> ScenarioResult {
    match scenario::run_scenario(&path, verbose).await {
        Ok(result) => result,
        Err(e) => ScenarioResult {
            name: path.display().to_string(),
            passed: false,
            checks_run: 0,
            checks_total: 0,
            error: Some(e.to_string()),
        },
    }
}

fn print_defaults() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "Retry defaults:".blue().bold());
    println!("  max_retries: {}", config.retry.max_retries);
    println!("  delay_secs:  {}", config.retry.delay_secs);

    println!("\n{}", "Built-in retry signatures:".blue().bold());
    for (pattern, reason) in DEFAULT_RETRYABLE_ERRORS {
        println!("  {} {}", pattern, reason.dimmed());
    }

    if !config.signatures.is_empty() {
        println!("\n{}", "Config-file retry signatures:".blue().bold());
        for (pattern, reason) in &config.signatures {
            println!("  {} {}", pattern, reason.dimmed());
        }
    }

    Ok(())
}

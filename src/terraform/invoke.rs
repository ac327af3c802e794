//! Provisioning command invocation
//!
//! Spawns the provisioning binary, captures stdout and stderr into one
//! combined text, and wraps the commands a scenario needs in the bounded
//! retry loop. Every command blocks the scenario until it completes; retry
//! decisions are made only on finished attempts.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command as TokioCommand;

use crate::common::Result;
use crate::retry::{run_with_retries, CommandFailure};

use super::options::Options;

/// Run `init` followed by `apply`, each under the options' retry policy
pub async fn init_and_apply(options: &Options) -> Result<String> {
    init(options).await?;
    apply(options).await
}

/// Run `init`
pub async fn init(options: &Options) -> Result<String> {
    run_command(options, &["init", "-input=false"]).await
}

/// Run `apply -auto-approve` with the configured variables
pub async fn apply(options: &Options) -> Result<String> {
    let mut args = vec![
        "apply".to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
    ];
    args.extend(var_args(options));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_command(options, &args).await
}

/// Run `destroy -auto-approve` with the configured variables
pub async fn destroy(options: &Options) -> Result<String> {
    let mut args = vec![
        "destroy".to_string(),
        "-input=false".to_string(),
        "-auto-approve".to_string(),
    ];
    args.extend(var_args(options));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_command(options, &args).await
}

/// Run one provisioning command under the options' retry policy
pub async fn run_command(options: &Options, args: &[&str]) -> Result<String> {
    let policy = options.retry_policy()?;
    let binary = options.resolve_binary()?;
    let args = full_args(options, args);

    tracing::debug!(binary = %binary.display(), ?args, "provisioning command");
    run_with_retries(&policy, || run_once(&binary, &options.terraform_dir, options, &args)).await
}

/// One invocation attempt: spawn, wait, capture combined output
async fn run_once(
    binary: &Path,
    dir: &Path,
    options: &Options,
    args: &[String],
) -> std::result::Result<String, CommandFailure> {
    let result = TokioCommand::new(binary)
        .args(args)
        .current_dir(dir)
        .envs(&options.env_vars)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await;

    let output = match result {
        Ok(output) => output,
        // spawn failures surface through the same channel; no signature will
        // match them, so they fail permanently
        Err(e) => {
            return Err(CommandFailure {
                output: format!("failed to execute '{}': {}", binary.display(), e),
                status: None,
            })
        }
    };

    let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        if !combined.is_empty() && !combined.ends_with('\n') {
            combined.push('\n');
        }
        combined.push_str(&stderr);
    }

    if output.status.success() {
        Ok(combined)
    } else {
        Err(CommandFailure {
            output: combined,
            status: output.status.code(),
        })
    }
}

/// Subcommand args plus the shared flags and position of `-no-color`
fn full_args(options: &Options, args: &[&str]) -> Vec<String> {
    let mut full: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    if options.no_color {
        // tool flags go after the subcommand
        full.insert(1, "-no-color".to_string());
    }
    full
}

/// `-var` and `-var-file` arguments for apply/destroy
fn var_args(options: &Options) -> Vec<String> {
    let mut args = Vec::new();
    for (name, value) in &options.vars {
        args.push("-var".to_string());
        args.push(format_var(name, value));
    }
    for file in &options.var_files {
        args.push(format!("-var-file={}", file.display()));
    }
    args
}

/// Render one variable: strings pass through raw, composites as JSON syntax
fn format_var(name: &str, value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => format!("{name}={s}"),
        other => format!("{name}={other}"),
    }
}

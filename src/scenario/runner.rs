//! Scenario runner implementation
//!
//! Executes a YAML scenario: provision the stack with retries, assert the
//! declared outputs against the expected fixtures, and always tear the
//! workspace down, whatever the earlier outcome.

use std::path::Path;

use colored::Colorize;

use crate::assert::assert_outputs_equal;
use crate::common::config::Config;
use crate::common::{Error, Result};
use crate::output::OutputValue;
use crate::terraform::{Options, Workspace};

use super::config::{OutputAssertion, ScenarioConfig};

/// Result of a scenario run
#[derive(Debug)]
pub struct ScenarioResult {
    pub name: String,
    pub passed: bool,
    pub checks_run: usize,
    pub checks_total: usize,
    pub error: Option<String>,
}

/// Run a test scenario from a YAML file
pub async fn run_scenario(path: &Path, verbose: bool) -> Result<ScenarioResult> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Scenario(format!(
            "Failed to read scenario '{}': {}",
            path.display(),
            e
        ))
    })?;

    let scenario: ScenarioConfig = serde_yaml::from_str(&content)
        .map_err(|e| Error::Scenario(format!("Failed to parse scenario: {}", e)))?;

    let checks_total = scenario.outputs.len();

    println!(
        "\n{} {}",
        "Running Scenario:".blue().bold(),
        scenario.name.white().bold()
    );

    if let Some(desc) = &scenario.description {
        println!("  {}", desc.dimmed());
    }

    // Resolve the infrastructure dir relative to the scenario file
    let scenario_dir = path.parent().unwrap_or(Path::new("."));
    let options = build_options(&scenario, scenario_dir)?;

    if verbose {
        println!(
            "  dir: {}",
            options.terraform_dir.display().to_string().dimmed()
        );
        println!(
            "  retries: {} every {:?}",
            options.max_retries, options.time_between_retries
        );
    }

    let workspace = if scenario.terraform.copy_to_temp {
        Workspace::copy_to_temp(options)?
    } else {
        Workspace::new(options)?
    };

    // Provision
    println!("\n{}", "Provisioning:".cyan());
    if let Err(e) = workspace.init_and_apply().await {
        println!("  {} init and apply: {}", "✗".red(), e);
        let result = failed(&scenario, 0, checks_total, e);
        teardown(workspace).await;
        return Ok(result);
    }
    println!("  {} init and apply", "✓".green());

    // Assert outputs
    println!("\n{}", "Checks:".cyan());
    for (i, assertion) in scenario.outputs.iter().enumerate() {
        let check_num = i + 1;
        match execute_check(&workspace, assertion).await {
            Ok(()) => {
                println!(
                    "  {} Check {}: output '{}'",
                    "✓".green(),
                    check_num,
                    assertion.output.dimmed()
                );
            }
            Err(e) => {
                println!("  {} Check {}: {}", "✗".red(), check_num, e);
                let result = failed(&scenario, check_num, checks_total, e);
                teardown(workspace).await;
                return Ok(result);
            }
        }
    }

    // Teardown failures fail an otherwise green scenario
    if let Some(e) = teardown(workspace).await {
        return Ok(failed(&scenario, checks_total, checks_total, e));
    }

    println!(
        "\n{} {}\n",
        "✓".green().bold(),
        "Scenario Passed".green().bold()
    );

    Ok(ScenarioResult {
        name: scenario.name,
        passed: true,
        checks_run: checks_total,
        checks_total,
        error: None,
    })
}

/// Evaluate one output assertion through the canonical-encoding comparison
async fn execute_check(workspace: &Workspace, assertion: &OutputAssertion) -> Result<()> {
    let actual = workspace.read_output(&assertion.output).await?;
    assert_outputs_equal(actual, OutputValue::from(&assertion.equals))
}

/// Destroy the workspace, logging rather than masking earlier failures
async fn teardown(workspace: Workspace) -> Option<Error> {
    match workspace.destroy().await {
        Ok(_) => {
            println!("  {} destroy", "✓".green());
            None
        }
        Err(e) => {
            tracing::error!(error = %e, "destroy failed");
            println!("  {} destroy: {}", "✗".red(), e);
            Some(e)
        }
    }
}

fn failed(
    scenario: &ScenarioConfig,
    checks_run: usize,
    checks_total: usize,
    error: Error,
) -> ScenarioResult {
    ScenarioResult {
        name: scenario.name.clone(),
        passed: false,
        checks_run,
        checks_total,
        error: Some(error.to_string()),
    }
}

/// Build invocation options from the scenario block plus config-file defaults
fn build_options(scenario: &ScenarioConfig, scenario_dir: &Path) -> Result<Options> {
    let dir = if scenario.terraform.dir.is_relative() {
        scenario_dir.join(&scenario.terraform.dir)
    } else {
        scenario.terraform.dir.clone()
    };

    let config = Config::load()?;
    let mut options = Options::new(dir);
    options.max_retries = scenario.retry.max_retries;
    if let Some(delay) = scenario.retry.delay_secs {
        options.time_between_retries = std::time::Duration::from_secs(delay);
    }
    options.retryable_errors = scenario.retry.signatures.clone();
    // config defaults fill the budget first so the built-in signature merge
    // does not shadow a configured one
    options = options.with_config_defaults(&config);
    if scenario.retry.use_default_signatures {
        options = options.with_default_retryable_errors();
    }

    for (name, value) in &scenario.terraform.vars {
        let json = serde_json::to_value(value).map_err(|e| {
            Error::Scenario(format!("Variable '{}' is not JSON-typed: {}", name, e))
        })?;
        options.vars.insert(name.clone(), json);
    }
    options.var_files = scenario
        .terraform
        .var_files
        .iter()
        .map(|f| {
            if f.is_relative() {
                scenario_dir.join(f)
            } else {
                f.clone()
            }
        })
        .collect();

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ScenarioConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_build_options_resolves_relative_paths() {
        let scenario = parse(
            r#"
name: t
terraform:
  dir: infra
  var_files: [varfile.tfvars]
outputs: []
"#,
        );
        let options = build_options(&scenario, Path::new("/scenarios")).unwrap();
        assert_eq!(options.terraform_dir, Path::new("/scenarios/infra"));
        assert_eq!(options.var_files[0], Path::new("/scenarios/varfile.tfvars"));
    }

    #[test]
    fn test_build_options_merges_default_signatures() {
        let scenario = parse(
            r#"
name: t
terraform:
  dir: infra
retry:
  max_retries: 2
  signatures:
    ".*rate limited.*": "api rate limit"
outputs: []
"#,
        );
        let options = build_options(&scenario, Path::new("/")).unwrap();
        assert_eq!(options.max_retries, 2);
        assert!(options.retryable_errors.contains_key(".*rate limited.*"));
        assert!(options
            .retryable_errors
            .contains_key(".*connection reset by peer.*"));
    }

    #[test]
    fn test_build_options_can_opt_out_of_defaults() {
        let scenario = parse(
            r#"
name: t
terraform:
  dir: infra
retry:
  use_default_signatures: false
outputs: []
"#,
        );
        let options = build_options(&scenario, Path::new("/")).unwrap();
        assert!(!options
            .retryable_errors
            .contains_key(".*connection reset by peer.*"));
    }
}

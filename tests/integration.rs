//! End-to-end integration tests for the harness
//!
//! These tests drive the full provisioning flow against a fake provisioning
//! binary (a shell script) that fails a configurable number of apply attempts
//! with a chosen failure text, serves canned JSON outputs, and records
//! destroy invocations. This verifies the retry loop, output decoding, the
//! structural comparator and the teardown guarantee without a real
//! provisioning tool.

#![cfg(unix)]

use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::PathBuf;
use std::time::Duration;

use tempfile::TempDir;

use stacktest::terraform::{self, Options, Workspace};
use stacktest::{assert_outputs_equal, deep_equal, Error, OutputValue};

const FAKE_TERRAFORM: &str = include_str!("fixtures/fake-terraform.sh");

/// Test context owning the fake binary, an infra dir and the script state
struct TestContext {
    temp: TempDir,
    binary: PathBuf,
    infra_dir: PathBuf,
    state_dir: PathBuf,
    outputs_file: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");

        let binary = temp.path().join("fake-terraform");
        fs::write(&binary, FAKE_TERRAFORM).expect("Failed to write fake binary");
        fs::set_permissions(&binary, fs::Permissions::from_mode(0o755))
            .expect("Failed to mark fake binary executable");

        let infra_dir = temp.path().join("infra");
        fs::create_dir(&infra_dir).expect("Failed to create infra dir");
        fs::write(infra_dir.join("main.tf"), "# stack under test\n")
            .expect("Failed to write stack definition");

        let state_dir = temp.path().join("state");
        fs::create_dir(&state_dir).expect("Failed to create state dir");

        let outputs_file = temp.path().join("outputs.json");
        fs::write(&outputs_file, "{}").expect("Failed to write outputs file");

        Self {
            temp,
            binary,
            infra_dir,
            state_dir,
            outputs_file,
        }
    }

    /// Options wired to the fake binary, with no automatic retries
    fn options(&self) -> Options {
        let mut options = Options::new(self.infra_dir.clone());
        options.binary = Some(self.binary.clone());
        options.time_between_retries = Duration::ZERO;
        options.env_vars.insert(
            "FAKE_TF_STATE".to_string(),
            self.state_dir.display().to_string(),
        );
        options.env_vars.insert(
            "FAKE_TF_OUTPUTS".to_string(),
            self.outputs_file.display().to_string(),
        );
        options
    }

    /// Options with the net-blip signature and the given retry budget
    fn options_with_net_blip_retries(&self, max_retries: u32) -> Options {
        let mut options = self.options();
        options.max_retries = max_retries;
        options.retryable_errors.insert(
            ".*connection reset by peer.*".to_string(),
            "net blip".to_string(),
        );
        options
    }

    /// Make the next `count` apply attempts fail with `text`
    fn fail_applies(&self, options: &mut Options, count: u32, text: &str) {
        options
            .env_vars
            .insert("FAKE_TF_APPLY_FAILURES".to_string(), count.to_string());
        options
            .env_vars
            .insert("FAKE_TF_FAILURE_TEXT".to_string(), text.to_string());
    }

    /// Serve `value` as the full output map for `output -json`
    fn set_outputs(&self, value: serde_json::Value) {
        fs::write(&self.outputs_file, value.to_string()).expect("Failed to write outputs");
    }

    /// Number of apply attempts the fake binary has seen
    fn apply_attempts(&self) -> u32 {
        fs::read_to_string(self.state_dir.join("apply-attempts"))
            .map(|s| s.trim().parse().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Whether destroy has been invoked
    fn destroyed(&self) -> bool {
        self.state_dir.join("destroyed").exists()
    }
}

#[tokio::test]
async fn test_retries_transient_failures_until_success() {
    let ctx = TestContext::new();
    let mut options = ctx.options_with_net_blip_retries(3);
    // attempts 1-3 fail transiently, attempt 4 succeeds
    ctx.fail_applies(&mut options, 3, "read tcp: connection reset by peer");

    let workspace = Workspace::new(options).unwrap();
    let output = workspace.init_and_apply().await.unwrap();
    assert!(output.contains("Apply complete!"));
    assert_eq!(ctx.apply_attempts(), 4);

    workspace.destroy().await.unwrap();
    assert!(ctx.destroyed());
}

#[tokio::test]
async fn test_exhausted_budget_surfaces_last_failure_verbatim() {
    let ctx = TestContext::new();
    let mut options = ctx.options_with_net_blip_retries(3);
    ctx.fail_applies(&mut options, 10, "read tcp: connection reset by peer");

    let workspace = Workspace::new(options).unwrap();
    let err = workspace.init_and_apply().await.unwrap_err();

    // 1 initial + 3 retries, never a 5th attempt
    assert_eq!(ctx.apply_attempts(), 4);
    match err {
        Error::PermanentProvisioning { output, status } => {
            assert!(
                output.contains("Error on attempt 4: read tcp: connection reset by peer"),
                "last attempt's text must survive intact, got: {output}"
            );
            assert_eq!(status, Some(1));
        }
        other => panic!("unexpected error: {other}"),
    }

    workspace.destroy().await.unwrap();
}

#[tokio::test]
async fn test_unmatched_failure_is_permanent_after_one_attempt() {
    let ctx = TestContext::new();
    let mut options = ctx.options_with_net_blip_retries(3);
    ctx.fail_applies(&mut options, 10, "Error: quota exceeded for resource");

    let workspace = Workspace::new(options).unwrap();
    let err = workspace.init_and_apply().await.unwrap_err();

    assert_eq!(ctx.apply_attempts(), 1);
    assert!(matches!(err, Error::PermanentProvisioning { .. }));

    workspace.destroy().await.unwrap();
}

#[tokio::test]
async fn test_outputs_round_trip_nested_structures() {
    let ctx = TestContext::new();
    ctx.set_outputs(serde_json::json!({
        "example": {"sensitive": false, "type": "string", "value": "test"},
        "example_list": {"value": ["test"]},
        "example_map": {"value": {"expected": "test"}},
        "example_any": {"value": {"test": [["a"], ["b", "c"]]}},
    }));

    let workspace = Workspace::new(ctx.options()).unwrap();
    workspace.init_and_apply().await.unwrap();

    // typed conveniences
    assert_eq!(workspace.output_string("example").await.unwrap(), "test");
    assert_eq!(
        workspace.output_list("example_list").await.unwrap(),
        vec!["test"]
    );
    let map = workspace.output_map("example_map").await.unwrap();
    assert_eq!(map.get("expected").map(String::as_str), Some("test"));

    // nested structural comparison against a native fixture
    let outputs = workspace.read_outputs(&["example_any"]).await.unwrap();
    let mut expected = HashMap::new();
    expected.insert("test".to_string(), vec![vec!["a"], vec!["b", "c"]]);
    assert_outputs_equal(outputs["example_any"].clone(), expected).unwrap();

    workspace.destroy().await.unwrap();
    assert!(ctx.destroyed());
}

#[tokio::test]
async fn test_output_mismatch_reports_both_encodings() {
    let ctx = TestContext::new();
    ctx.set_outputs(serde_json::json!({
        "x": {"value": ["1", "2"]},
    }));

    let workspace = Workspace::new(ctx.options()).unwrap();
    workspace.init_and_apply().await.unwrap();

    let actual = workspace.read_output("x").await.unwrap();
    assert!(deep_equal(actual.clone(), vec!["1", "2"]));

    let err = assert_outputs_equal(actual, vec!["1", "3"]).unwrap_err();
    match err {
        Error::AssertionMismatch { actual, expected } => {
            assert_eq!(actual, r#"["1","2"]"#);
            assert_eq!(expected, r#"["1","3"]"#);
        }
        other => panic!("unexpected error: {other}"),
    }

    workspace.destroy().await.unwrap();
}

#[tokio::test]
async fn test_missing_output_is_an_error() {
    let ctx = TestContext::new();
    ctx.set_outputs(serde_json::json!({
        "example": {"value": "test"},
    }));

    let workspace = Workspace::new(ctx.options()).unwrap();
    workspace.init_and_apply().await.unwrap();

    let err = workspace.read_output("absent").await.unwrap_err();
    assert!(matches!(err, Error::OutputNotFound { .. }));

    workspace.destroy().await.unwrap();
}

#[tokio::test]
async fn test_dropped_workspace_still_destroys() {
    let ctx = TestContext::new();
    let workspace = Workspace::new(ctx.options()).unwrap();
    workspace.init_and_apply().await.unwrap();

    // dropped without an explicit destroy: the guard must release the stack
    drop(workspace);
    assert!(ctx.destroyed());
}

#[tokio::test]
async fn test_copy_to_temp_isolates_parallel_workspaces() {
    let ctx = TestContext::new();
    let a = Workspace::copy_to_temp(ctx.options()).unwrap();
    let b = Workspace::copy_to_temp(ctx.options()).unwrap();

    assert_ne!(a.options().terraform_dir, b.options().terraform_dir);
    assert!(a.options().terraform_dir.join("main.tf").exists());

    a.destroy().await.unwrap();
    b.destroy().await.unwrap();
}

#[tokio::test]
async fn test_free_function_surface() {
    let ctx = TestContext::new();
    ctx.set_outputs(serde_json::json!({
        "example": {"value": "test"},
    }));

    let options = ctx.options();
    terraform::init_and_apply(&options).await.unwrap();
    let value = terraform::read_output(&options, "example").await.unwrap();
    assert_eq!(value, OutputValue::Scalar("test".to_string()));
    terraform::destroy(&options).await.unwrap();

    // keep the temp dir alive to the end of the test
    drop(ctx.temp);
}

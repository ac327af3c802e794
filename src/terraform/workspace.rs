//! Scenario-owned provisioning workspaces
//!
//! A [`Workspace`] owns the provisioned environment for exactly one scenario:
//! it applies the stack, serves output reads, and guarantees that `destroy`
//! runs exactly once at scenario end. Dropping a workspace that was never
//! explicitly destroyed triggers a best-effort blocking destroy, so an early
//! error return still releases the stack.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Stdio;

use tempfile::TempDir;

use crate::common::{Error, Result};
use crate::output::OutputValue;

use super::invoke;
use super::options::Options;

/// Handle to one scenario's provisioning workspace
#[derive(Debug)]
pub struct Workspace {
    options: Options,
    // keeps the temp copy alive for the workspace lifetime
    _temp: Option<TempDir>,
    destroyed: bool,
}

impl Workspace {
    /// Open a workspace over the directory named in the options
    pub fn new(options: Options) -> Result<Self> {
        if !options.terraform_dir.is_dir() {
            return Err(Error::Config(format!(
                "Infrastructure directory not found: '{}'",
                options.terraform_dir.display()
            )));
        }
        Ok(Self {
            options,
            _temp: None,
            destroyed: false,
        })
    }

    /// Copy the infrastructure directory to a temp dir and open a workspace
    /// over the copy
    ///
    /// Keeps parallel scenarios against the same definition from sharing
    /// state files. Existing `.terraform` directories and state files are not
    /// copied.
    pub fn copy_to_temp(mut options: Options) -> Result<Self> {
        if !options.terraform_dir.is_dir() {
            return Err(Error::Config(format!(
                "Infrastructure directory not found: '{}'",
                options.terraform_dir.display()
            )));
        }
        let temp = TempDir::new()?;
        copy_dir_filtered(&options.terraform_dir, temp.path())?;
        options.terraform_dir = temp.path().to_path_buf();
        Ok(Self {
            options,
            _temp: Some(temp),
            destroyed: false,
        })
    }

    /// The options this workspace invokes commands with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Run `init` and `apply` under the retry policy
    pub async fn init_and_apply(&self) -> Result<String> {
        invoke::init_and_apply(&self.options).await
    }

    /// Read one named output
    pub async fn read_output(&self, name: &str) -> Result<OutputValue> {
        super::output::read_output(&self.options, name).await
    }

    /// Read a set of named outputs in one invocation
    pub async fn read_outputs(&self, names: &[&str]) -> Result<BTreeMap<String, OutputValue>> {
        super::output::read_outputs(&self.options, names).await
    }

    /// Read a scalar output as text
    pub async fn output_string(&self, name: &str) -> Result<String> {
        super::output::output_string(&self.options, name).await
    }

    /// Read a sequence output as element texts
    pub async fn output_list(&self, name: &str) -> Result<Vec<String>> {
        super::output::output_list(&self.options, name).await
    }

    /// Read a mapping output as value texts by key
    pub async fn output_map(&self, name: &str) -> Result<BTreeMap<String, String>> {
        super::output::output_map(&self.options, name).await
    }

    /// Destroy the stack and disarm the drop guard
    ///
    /// Runs under the retry policy like any other command.
    pub async fn destroy(mut self) -> Result<String> {
        self.destroyed = true;
        invoke::destroy(&self.options).await
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if self.destroyed {
            return;
        }
        tracing::warn!(
            dir = %self.options.terraform_dir.display(),
            "workspace dropped without explicit destroy, running blocking destroy"
        );
        // single blocking attempt, no retries on this path
        let binary = match self.options.resolve_binary() {
            Ok(binary) => binary,
            Err(e) => {
                tracing::error!(error = %e, "cannot destroy workspace");
                return;
            }
        };
        let result = std::process::Command::new(binary)
            .args(["destroy", "-no-color", "-input=false", "-auto-approve"])
            .current_dir(&self.options.terraform_dir)
            .envs(&self.options.env_vars)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match result {
            Ok(status) if status.success() => {
                tracing::info!("workspace destroyed on drop");
            }
            Ok(status) => {
                tracing::error!(?status, "destroy on drop failed");
            }
            Err(e) => {
                tracing::error!(error = %e, "destroy on drop failed to execute");
            }
        }
    }
}

/// Recursive copy skipping `.terraform` and local state files
fn copy_dir_filtered(src: &Path, dst: &Path) -> Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if name_str == ".terraform" || name_str.contains(".tfstate") {
            continue;
        }
        let target = dst.join(&name);
        if entry.file_type()?.is_dir() {
            std::fs::create_dir_all(&target)?;
            copy_dir_filtered(&entry.path(), &target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

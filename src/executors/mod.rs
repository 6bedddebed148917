// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Step executors
//!
//! This module provides the executor trait, the per-run context threaded
//! between steps, and the built-in executors (workspace, credentials,
//! setup, terraform, publish).

mod credentials;
#[cfg(test)]
mod mock_http;
mod plan;
mod publish;
mod setup;
mod terraform;
mod workspace;

pub use credentials::{AwsCredentials, CredentialsExecutor};
pub use plan::{CapturedPlan, PlanSummary};
pub use publish::{render_comment, PublishExecutor, PublishTarget};
pub use setup::{version_matches, SetupExecutor};
pub use terraform::{terraform_args, TerraformExecutor};
pub use workspace::WorkspaceExecutor;

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::process::Command;

use crate::config::DeployConfig;
use crate::errors::TfflowError;
use crate::pipeline::{StepKind, Trigger};

/// Result of running one step's external work
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Whether execution succeeded
    pub success: bool,

    /// Standard output
    pub stdout: String,

    /// Standard error
    pub stderr: String,

    /// Exit code
    pub exit_code: i32,

    /// Execution duration
    pub duration: Duration,
}

impl ExecutionResult {
    /// Create a successful result
    pub fn success(stdout: String, duration: Duration) -> Self {
        Self {
            success: true,
            stdout,
            stderr: String::new(),
            exit_code: 0,
            duration,
        }
    }

    /// Create a failed result
    pub fn failure(stderr: String, exit_code: i32, duration: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr,
            exit_code,
            duration,
        }
    }

    /// Best description of why the step failed
    pub fn failure_reason(&self) -> String {
        let stderr = self.stderr.trim();
        if !stderr.is_empty() {
            return stderr.to_string();
        }
        let stdout = self.stdout.trim();
        if !stdout.is_empty() {
            return stdout.to_string();
        }
        format!("exited with status {}", self.exit_code)
    }
}

/// State shared by the steps of one run
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Event that started the run
    pub trigger: Trigger,
    /// Directory every terraform step runs in
    pub working_dir: PathBuf,
    /// Environment exported by earlier steps (credentials, region)
    pub env: BTreeMap<String, String>,
    /// Terraform binary resolved by the setup step
    pub terraform_bin: Option<PathBuf>,
    /// Plan captured by the plan step
    pub plan: Option<CapturedPlan>,
    /// `terraform output` text
    pub outputs: Option<String>,
    /// Steps finished so far, in order, with their pass/fail state
    pub completed: Vec<(StepKind, bool)>,
}

impl RunContext {
    pub fn new(trigger: Trigger, working_dir: PathBuf) -> Self {
        Self {
            trigger,
            working_dir,
            env: BTreeMap::new(),
            terraform_bin: None,
            plan: None,
            outputs: None,
            completed: Vec::new(),
        }
    }
}

/// Trait for step executors
#[async_trait]
pub trait Executor: Send + Sync {
    /// Run one step.
    ///
    /// A tool that ran and failed is an `Ok` result with `success == false`;
    /// `Err` is reserved for failures to run at all.
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError>;
}

/// Run a prepared command and capture its output
pub(crate) async fn run_command(
    mut cmd: Command,
    tool: &str,
) -> Result<ExecutionResult, TfflowError> {
    let start = Instant::now();

    let output = cmd.output().await.map_err(|e| TfflowError::ToolInstallFailure {
        reason: format!("could not run {}: {}", tool, e),
        help: None,
    })?;

    let duration = start.elapsed();
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();

    Ok(ExecutionResult {
        success: output.status.success(),
        stdout,
        stderr,
        exit_code: output.status.code().unwrap_or(-1),
        duration,
    })
}

/// List the `*.tf` files directly inside a directory
pub fn terraform_sources(dir: &Path) -> Result<Vec<PathBuf>, TfflowError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = Path::new(&escaped).join("*.tf").to_string_lossy().to_string();
    let files = glob::glob(&pattern)
        .map_err(|e| TfflowError::InvalidConfig {
            reason: format!("bad working directory pattern: {}", e),
            help: None,
        })?
        .filter_map(Result::ok)
        .collect();
    Ok(files)
}

/// Create the standard executor set for a configuration
pub fn create_default_executors(config: Arc<DeployConfig>) -> HashMap<String, Box<dyn Executor>> {
    let mut executors: HashMap<String, Box<dyn Executor>> = HashMap::new();

    executors.insert("workspace".to_string(), Box::new(WorkspaceExecutor::new()));
    executors.insert(
        "credentials".to_string(),
        Box::new(CredentialsExecutor::from_process_env(config.clone())),
    );
    executors.insert("setup".to_string(), Box::new(SetupExecutor::new(config.clone())));
    executors.insert(
        "terraform".to_string(),
        Box::new(TerraformExecutor::new(config.clone())),
    );
    executors.insert(
        "publish".to_string(),
        Box::new(PublishExecutor::new(config, PublishTarget::from_process_env())),
    );

    executors
}

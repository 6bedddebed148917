// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Setup executor
//!
//! Resolves the terraform binary and checks it against the pinned version.

use async_trait::async_trait;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::process::Command;

use super::{run_command, ExecutionResult, Executor, RunContext};
use crate::config::DeployConfig;
use crate::errors::TfflowError;
use crate::pipeline::StepKind;

/// Subset of `terraform version -json`
#[derive(Debug, Deserialize)]
struct VersionOutput {
    terraform_version: String,
}

/// Setup executor
pub struct SetupExecutor {
    config: Arc<DeployConfig>,
}

impl SetupExecutor {
    /// Create a new setup executor
    pub fn new(config: Arc<DeployConfig>) -> Self {
        Self { config }
    }

    fn locate(&self) -> Result<PathBuf, TfflowError> {
        match &self.config.terraform.path {
            Some(path) if path.exists() => Ok(path.clone()),
            Some(path) => Err(TfflowError::ToolInstallFailure {
                reason: format!("terraform.path does not exist: {}", path.display()),
                help: None,
            }),
            None => which::which("terraform").map_err(|_| TfflowError::terraform_not_found()),
        }
    }
}

/// Whether an installed version satisfies a pin.
///
/// A pin matches itself exactly, or any version it is a dotted prefix of
/// (`1.6` matches `1.6.6`, not `1.60.0`).
pub fn version_matches(pin: &str, installed: &str) -> bool {
    let pin = pin.trim().trim_start_matches('v');
    let installed = installed.trim().trim_start_matches('v');
    installed == pin || installed.starts_with(&format!("{}.", pin))
}

#[async_trait]
impl Executor for SetupExecutor {
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError> {
        if step != StepKind::InstallTool {
            return Err(TfflowError::ExecutorNotFound {
                name: format!("setup/{}", step),
            });
        }

        let start = Instant::now();
        let bin = self.locate()?;

        let mut cmd = Command::new(&bin);
        cmd.arg("version").arg("-json");
        let result = run_command(cmd, "terraform").await?;
        if !result.success {
            return Ok(result);
        }

        let version: VersionOutput = serde_json::from_str(&result.stdout).map_err(|e| {
            TfflowError::ToolInstallFailure {
                reason: format!(
                    "unparseable terraform version output from {}: {}",
                    bin.display(),
                    e
                ),
                help: Some("terraform.path must point at a Terraform 0.13 or newer binary".into()),
            }
        })?;
        tracing::info!(
            bin = %bin.display(),
            version = %version.terraform_version,
            "terraform located"
        );

        if let Some(pin) = &self.config.terraform.version {
            if !version_matches(pin, &version.terraform_version) {
                return Ok(ExecutionResult::failure(
                    format!(
                        "terraform {} is installed but {} is required",
                        version.terraform_version, pin
                    ),
                    1,
                    start.elapsed(),
                ));
            }
        }

        ctx.terraform_bin = Some(bin);

        Ok(ExecutionResult::success(
            format!("terraform {}", version.terraform_version),
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Trigger;

    #[test]
    fn test_version_matches() {
        assert!(version_matches("1.6.6", "1.6.6"));
        assert!(version_matches("v1.6.6", "1.6.6"));
        assert!(version_matches("1.6", "1.6.6"));
        assert!(!version_matches("1.6", "1.60.0"));
        assert!(!version_matches("1.6.6", "1.6.5"));
    }

    #[tokio::test]
    async fn test_missing_explicit_path_fails() {
        let mut config = DeployConfig::starter("vpc");
        config.terraform.path = Some("/nonexistent/terraform".into());
        let executor = SetupExecutor::new(Arc::new(config));
        let mut ctx = RunContext::new(Trigger::PushToMain, ".".into());

        let err = executor
            .execute(StepKind::InstallTool, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, TfflowError::ToolInstallFailure { .. }));
        assert!(ctx.terraform_bin.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_pinned_version_checked() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("terraform");
        std::fs::write(
            &fake,
            "#!/bin/sh\necho '{\"terraform_version\":\"1.5.7\",\"platform\":\"linux_amd64\"}'\n",
        )
        .unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = DeployConfig::starter("vpc");
        config.terraform.path = Some(fake.clone());

        config.terraform.version = Some("1.6.6".into());
        let executor = SetupExecutor::new(Arc::new(config.clone()));
        let mut ctx = RunContext::new(Trigger::PushToMain, ".".into());
        let result = executor.execute(StepKind::InstallTool, &mut ctx).await.unwrap();
        assert!(!result.success);
        assert!(result.stderr.contains("1.6.6 is required"));

        config.terraform.version = Some("1.5".into());
        let executor = SetupExecutor::new(Arc::new(config));
        let result = executor.execute(StepKind::InstallTool, &mut ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(ctx.terraform_bin, Some(fake));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_json_version_output_is_setup_failure() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let fake = dir.path().join("terraform");
        std::fs::write(&fake, "#!/bin/sh\necho 'Terraform v0.12.31'\n").unwrap();
        std::fs::set_permissions(&fake, std::fs::Permissions::from_mode(0o755)).unwrap();

        let mut config = DeployConfig::starter("vpc");
        config.terraform.path = Some(fake);
        let executor = SetupExecutor::new(Arc::new(config));
        let mut ctx = RunContext::new(Trigger::PushToMain, ".".into());

        let err = executor
            .execute(StepKind::InstallTool, &mut ctx)
            .await
            .unwrap_err();
        match err {
            TfflowError::ToolInstallFailure { reason, .. } => {
                assert!(reason.contains("unparseable terraform version output"))
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(ctx.terraform_bin.is_none());
    }
}

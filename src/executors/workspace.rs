// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Workspace executor
//!
//! Checks that the configured working directory holds a Terraform root module.

use async_trait::async_trait;
use std::time::Instant;

use super::{terraform_sources, ExecutionResult, Executor, RunContext};
use crate::errors::TfflowError;
use crate::pipeline::StepKind;

/// Workspace executor
pub struct WorkspaceExecutor;

impl WorkspaceExecutor {
    /// Create a new workspace executor
    pub fn new() -> Self {
        Self
    }
}

impl Default for WorkspaceExecutor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Executor for WorkspaceExecutor {
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError> {
        if step != StepKind::Checkout {
            return Err(TfflowError::ExecutorNotFound {
                name: format!("workspace/{}", step),
            });
        }

        let start = Instant::now();
        let dir = &ctx.working_dir;

        if !dir.is_dir() {
            return Ok(ExecutionResult::failure(
                format!("working directory not found: {}", dir.display()),
                1,
                start.elapsed(),
            ));
        }

        let sources = terraform_sources(dir)?;
        if sources.is_empty() {
            return Ok(ExecutionResult::failure(
                format!("no *.tf files in {}", dir.display()),
                1,
                start.elapsed(),
            ));
        }

        tracing::debug!(dir = %dir.display(), files = sources.len(), "workspace ready");

        Ok(ExecutionResult::success(
            format!("{} Terraform file(s) in {}", sources.len(), dir.display()),
            start.elapsed(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Trigger;

    #[tokio::test]
    async fn test_checkout_requires_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut ctx = RunContext::new(Trigger::PushToMain, dir.path().to_path_buf());

        let result = WorkspaceExecutor::new()
            .execute(StepKind::Checkout, &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.stderr.contains("no *.tf files"));

        std::fs::write(dir.path().join("main.tf"), "").unwrap();
        let result = WorkspaceExecutor::new()
            .execute(StepKind::Checkout, &mut ctx)
            .await
            .unwrap();
        assert!(result.success);
    }

    #[tokio::test]
    async fn test_checkout_missing_directory() {
        let mut ctx = RunContext::new(Trigger::PushToMain, "/nonexistent/terraform".into());
        let result = WorkspaceExecutor::new()
            .execute(StepKind::Checkout, &mut ctx)
            .await
            .unwrap();
        assert!(!result.success);
        assert!(result.stderr.contains("not found"));
    }
}

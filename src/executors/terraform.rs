// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Terraform executor
//!
//! Runs the terraform subcommands behind format-check, init, validate, plan,
//! apply, output and the destroy variants.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::process::Command;

use super::{run_command, CapturedPlan, ExecutionResult, Executor, RunContext};
use crate::config::{DeployConfig, TerraformConfig};
use crate::errors::TfflowError;
use crate::pipeline::StepKind;

/// Terraform executor
pub struct TerraformExecutor {
    config: Arc<DeployConfig>,
}

impl TerraformExecutor {
    /// Create a new terraform executor
    pub fn new(config: Arc<DeployConfig>) -> Self {
        Self { config }
    }

    /// Build the command for a step
    fn build_command(&self, step: StepKind, ctx: &RunContext) -> Result<Command, TfflowError> {
        let bin = ctx
            .terraform_bin
            .as_ref()
            .ok_or_else(|| TfflowError::ToolInstallFailure {
                reason: format!("terraform was not set up before '{}'", step),
                help: None,
            })?;

        let args = terraform_args(step, &self.config.terraform).ok_or_else(|| {
            TfflowError::ExecutorNotFound {
                name: format!("terraform/{}", step),
            }
        })?;

        tracing::debug!(step = %step, "terraform {}", args.join(" "));

        let mut cmd = Command::new(bin);
        cmd.args(&args);
        cmd.current_dir(&ctx.working_dir);
        cmd.envs(&self.config.env);
        cmd.envs(&ctx.env);
        cmd.env("TF_IN_AUTOMATION", "1");
        cmd.env("TF_INPUT", "0");

        Ok(cmd)
    }
}

/// Arguments for the terraform subcommand behind a step.
///
/// `None` for steps that are not terraform invocations.
pub fn terraform_args(step: StepKind, config: &TerraformConfig) -> Option<Vec<String>> {
    let var_files = || {
        config
            .var_files
            .iter()
            .map(|f| format!("-var-file={}", f.display()))
            .collect::<Vec<_>>()
    };

    let args: Vec<String> = match step {
        StepKind::FormatCheck => vec![
            "fmt".into(),
            "-check".into(),
            "-recursive".into(),
            "-no-color".into(),
        ],
        StepKind::Init => {
            let mut args: Vec<String> =
                vec!["init".into(), "-input=false".into(), "-no-color".into()];
            args.extend(
                config
                    .backend_config
                    .iter()
                    .map(|(k, v)| format!("-backend-config={}={}", k, v)),
            );
            args
        }
        StepKind::Validate => vec!["validate".into(), "-no-color".into()],
        StepKind::Plan => {
            let mut args: Vec<String> =
                vec!["plan".into(), "-input=false".into(), "-no-color".into()];
            args.extend(var_files());
            if let Some(file) = &config.plan_file {
                args.push(format!("-out={}", file));
            }
            args
        }
        StepKind::Apply => {
            let mut args: Vec<String> = vec![
                "apply".into(),
                "-input=false".into(),
                "-no-color".into(),
                "-auto-approve".into(),
            ];
            match &config.plan_file {
                Some(file) => args.push(file.clone()),
                None => args.extend(var_files()),
            }
            args
        }
        StepKind::ShowOutputs => vec!["output".into(), "-no-color".into()],
        StepKind::PlanDestroy => {
            let mut args: Vec<String> = vec![
                "plan".into(),
                "-destroy".into(),
                "-input=false".into(),
                "-no-color".into(),
            ];
            args.extend(var_files());
            if let Some(file) = &config.destroy_plan_file {
                args.push(format!("-out={}", file));
            }
            args
        }
        StepKind::ApplyDestroy => match &config.destroy_plan_file {
            Some(file) => vec![
                "apply".into(),
                "-input=false".into(),
                "-no-color".into(),
                "-auto-approve".into(),
                file.clone(),
            ],
            None => {
                let mut args: Vec<String> = vec![
                    "destroy".into(),
                    "-input=false".into(),
                    "-no-color".into(),
                    "-auto-approve".into(),
                ];
                args.extend(var_files());
                args
            }
        },
        _ => return None,
    };

    Some(args)
}

#[async_trait]
impl Executor for TerraformExecutor {
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError> {
        let cmd = self.build_command(step, ctx)?;
        let result = run_command(cmd, "terraform").await?;

        if !result.success {
            return Ok(result);
        }

        match step {
            StepKind::Plan | StepKind::PlanDestroy => {
                let plan_file = if step == StepKind::Plan {
                    &self.config.terraform.plan_file
                } else {
                    &self.config.terraform.destroy_plan_file
                };
                let plan_path = plan_file.as_ref().map(|f| ctx.working_dir.join(f));
                let plan = CapturedPlan::capture(result.stdout.clone(), plan_path.as_deref());

                match &plan.summary {
                    Some(summary) => {
                        tracing::info!(digest = plan.short_digest(), "plan: {}", summary)
                    }
                    None => tracing::warn!("plan output has no summary line"),
                }

                ctx.plan = Some(plan);
            }
            StepKind::ShowOutputs => {
                ctx.outputs = Some(result.stdout.clone());
            }
            _ => {}
        }

        Ok(result)
    }
}

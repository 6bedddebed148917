// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Deploy and destroy commands - execute a pipeline

use colored::Colorize;
use miette::Result;
use std::path::Path;
use std::sync::Arc;

use crate::config::{ConfigValidator, DeployConfig};
use crate::errors::RecoverySuggestion;
use crate::executors::{create_default_executors, RunContext};
use crate::pipeline::{
    trigger, ExecutionOptions, Pipeline, PipelineExecutor, PipelineKind, TriggerOverride,
};
use crate::utils;

/// Run the deploy or destroy pipeline
pub async fn run(
    kind: PipelineKind,
    config_path: &Path,
    overrides: TriggerOverride,
    dry_run: bool,
    verbose: bool,
) -> Result<()> {
    let config = DeployConfig::from_file(config_path)?;

    let validation = ConfigValidator::validate(&config);
    if !validation.is_valid() {
        eprintln!("{}", "Configuration is invalid:".red().bold());
        for error in &validation.errors {
            eprintln!("  {} {}", "✗".red(), error);
        }
        return Err(miette::miette!("Configuration is invalid"));
    }

    if validation.has_warnings() && verbose {
        eprintln!("{}", "Configuration warnings:".yellow().bold());
        for warning in &validation.warnings {
            eprintln!("  {} {}", "⚠".yellow(), warning);
        }
        eprintln!();
    }

    let trigger = trigger::resolve(&overrides, |k| std::env::var(k).ok(), &config.main_branch)?;

    let repo_root = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let working_dir = config.resolve_working_dir(&repo_root);

    let pipeline = Pipeline::resolve(kind, &trigger);
    let config = Arc::new(config);

    let mut executor = PipelineExecutor::new();
    for (name, exec) in create_default_executors(config.clone()) {
        executor.register_executor(&name, exec);
    }

    let options = ExecutionOptions {
        dry_run,
        verbose,
        progress: utils::progress_enabled(verbose),
    };

    let mut ctx = RunContext::new(trigger, working_dir);
    let run = executor.execute(&pipeline, &mut ctx, &options).await;

    if let Err(error) = run.into_result() {
        if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
            eprintln!();
            eprint!("{}", suggestion);
        }
        return Err(error.into());
    }

    if let Some(outputs) = ctx.outputs.as_deref().filter(|o| !o.trim().is_empty()) {
        println!();
        println!("{}:", "Outputs".bold());
        for line in outputs.lines() {
            println!("  {}", line);
        }
    }

    Ok(())
}

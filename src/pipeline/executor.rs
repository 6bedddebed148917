// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Pipeline executor
//!
//! Runs a resolved pipeline's steps in order and stops at the first failure.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use colored::Colorize;

use crate::errors::TfflowError;
use crate::executors::{ExecutionResult, Executor, RunContext};
use crate::pipeline::{gate, Pipeline, PipelineKind, StepKind};
use crate::utils;

/// Pipeline execution options
#[derive(Debug, Clone, Default)]
pub struct ExecutionOptions {
    /// Only show what would be done
    pub dry_run: bool,
    /// Verbose output
    pub verbose: bool,
    /// Show a spinner while a step runs
    pub progress: bool,
}

/// Outcome of one step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    Passed,
    Failed(String),
}

/// Result of one step within a run
#[derive(Debug, Clone)]
pub struct StepResult {
    pub step: StepKind,
    pub outcome: StepOutcome,
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl StepResult {
    pub fn passed(&self) -> bool {
        self.outcome == StepOutcome::Passed
    }
}

/// Terminal state of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Success,
    Failed,
}

/// Result of executing a pipeline
#[derive(Debug)]
pub struct PipelineRun {
    /// Which pipeline ran
    pub kind: PipelineKind,
    /// Results for each executed step, in order
    pub results: Vec<StepResult>,
    /// Success, or Failed from the first failing step on
    pub status: RunStatus,
    /// Total execution time
    pub duration: Duration,
    /// Error of the failing step
    failure: Option<TfflowError>,
}

impl PipelineRun {
    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }

    /// Steps that ran, in order
    pub fn executed(&self) -> Vec<StepKind> {
        self.results.iter().map(|r| r.step).collect()
    }

    /// The step that ended the run, if any
    pub fn failed_step(&self) -> Option<&StepResult> {
        self.results.iter().find(|r| !r.passed())
    }

    /// Turn a failed run into the error for its failing step
    pub fn into_result(mut self) -> Result<Self, TfflowError> {
        match self.failure.take() {
            Some(error) => Err(error),
            None => Ok(self),
        }
    }
}

/// Pipeline executor
pub struct PipelineExecutor {
    /// Registered executors by name
    executors: HashMap<String, Box<dyn Executor>>,
}

impl PipelineExecutor {
    /// Create a new pipeline executor
    pub fn new() -> Self {
        Self {
            executors: HashMap::new(),
        }
    }

    /// Register an executor under a name
    pub fn register_executor(&mut self, name: &str, executor: Box<dyn Executor>) {
        self.executors.insert(name.to_string(), executor);
    }

    /// Execute a pipeline
    pub async fn execute(
        &self,
        pipeline: &Pipeline,
        ctx: &mut RunContext,
        options: &ExecutionOptions,
    ) -> PipelineRun {
        let start = Instant::now();

        self.print_execution_plan(pipeline, ctx);

        if options.dry_run {
            return PipelineRun {
                kind: pipeline.kind,
                results: Vec::new(),
                status: RunStatus::Success,
                duration: start.elapsed(),
                failure: None,
            };
        }

        tracing::info!(
            pipeline = %pipeline.kind,
            trigger = ctx.trigger.event_name(),
            dir = %ctx.working_dir.display(),
            "starting run"
        );

        let mut results = Vec::with_capacity(pipeline.steps.len());
        let mut status = RunStatus::Success;
        let mut failure = None;

        for &step in &pipeline.steps {
            let spinner = options
                .progress
                .then(|| utils::create_spinner(&format!("{}...", step)));
            if spinner.is_none() {
                println!("  {} {}...", "→".blue(), step);
            }

            tracing::info!(step = %step, "step started");
            let (result, error) = self.run_step(step, ctx).await;

            if let Some(spinner) = spinner {
                spinner.finish_and_clear();
            }

            let passed = result.passed();
            ctx.completed.push((step, passed));
            utils::print_step_line(&result, options.verbose);

            if let StepOutcome::Failed(reason) = &result.outcome {
                tracing::warn!(step = %step, "step failed: {}", first_line(reason));
                results.push(result);
                status = RunStatus::Failed;
                failure = error;
                break;
            }

            tracing::info!(step = %step, secs = result.duration.as_secs_f64(), "step passed");
            results.push(result);
        }

        let duration = start.elapsed();

        println!();
        match status {
            RunStatus::Success => println!(
                "{}",
                format!(
                    "{} completed successfully in {:.2}s",
                    pipeline.kind,
                    duration.as_secs_f64()
                )
                .green()
            ),
            RunStatus::Failed => println!(
                "{}",
                format!("{} failed after {:.2}s", pipeline.kind, duration.as_secs_f64()).red()
            ),
        }

        PipelineRun {
            kind: pipeline.kind,
            results,
            status,
            duration,
            failure,
        }
    }

    /// Run one step, folding every kind of failure into its outcome.
    ///
    /// The error is kept alongside so the run can report it unchanged.
    async fn run_step(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> (StepResult, Option<TfflowError>) {
        let start = Instant::now();

        let executed = match step {
            StepKind::ConfirmGate => gate::check_trigger(&ctx.trigger).map(|()| {
                ExecutionResult::success("confirmation accepted".into(), start.elapsed())
            }),
            StepKind::ReportSuccess => Ok(ExecutionResult::success(
                "destroy complete; all managed resources removed".into(),
                start.elapsed(),
            )),
            _ => match self.executors.get(step.executor_name()) {
                Some(executor) => executor.execute(step, ctx).await,
                None => Err(TfflowError::ExecutorNotFound {
                    name: step.executor_name().to_string(),
                }),
            },
        };

        match executed {
            Ok(result) if result.success => (
                StepResult {
                    step,
                    outcome: StepOutcome::Passed,
                    stdout: result.stdout,
                    stderr: result.stderr,
                    duration: start.elapsed(),
                },
                None,
            ),
            Ok(result) => {
                let reason = result.failure_reason();
                (
                    StepResult {
                        step,
                        outcome: StepOutcome::Failed(reason.clone()),
                        stdout: result.stdout,
                        stderr: result.stderr,
                        duration: start.elapsed(),
                    },
                    Some(TfflowError::for_failed_step(step, reason)),
                )
            }
            Err(e) => (
                StepResult {
                    step,
                    outcome: StepOutcome::Failed(e.to_string()),
                    stdout: String::new(),
                    stderr: e.to_string(),
                    duration: start.elapsed(),
                },
                Some(e),
            ),
        }
    }

    /// Print the execution plan
    fn print_execution_plan(&self, pipeline: &Pipeline, ctx: &RunContext) {
        println!();
        println!("{}: {} ({})", "Pipeline".bold(), pipeline.kind, ctx.trigger);
        println!("{}", "═".repeat(50));
        println!(
            "Execution plan ({} step{}) in {}:",
            pipeline.steps.len(),
            if pipeline.steps.len() == 1 { "" } else { "s" },
            ctx.working_dir.display()
        );
        println!();

        for (i, step) in pipeline.steps.iter().enumerate() {
            print!("  {}. {}", i + 1, step.to_string().bold());
            if step.is_mutating() {
                print!(" {}", "[mutates infrastructure]".yellow());
            }
            println!();
        }

        println!();
    }
}

impl Default for PipelineExecutor {
    fn default() -> Self {
        Self::new()
    }
}

fn first_line(text: &str) -> &str {
    text.lines().next().unwrap_or("")
}

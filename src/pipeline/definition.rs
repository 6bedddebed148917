// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Pipeline definition structures
//!
//! Triggers, step kinds and the fixed step order of both pipelines.

use crate::pipeline::branch::{select_branch, Branch};

/// Event that started a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Push to the main branch
    PushToMain,
    /// Pull request opened or updated
    PullRequest {
        /// Pull request number, when known
        number: Option<u64>,
    },
    /// Manual workflow dispatch
    ManualDispatch {
        /// Text typed into the confirmation input
        confirmation: Option<String>,
    },
}

impl Trigger {
    /// Short event name, matching the CI event names
    pub fn event_name(&self) -> &'static str {
        match self {
            Self::PushToMain => "push",
            Self::PullRequest { .. } => "pull_request",
            Self::ManualDispatch { .. } => "workflow_dispatch",
        }
    }

    /// Confirmation string; only manual dispatch carries one
    pub fn confirmation(&self) -> Option<&str> {
        match self {
            Self::ManualDispatch { confirmation } => confirmation.as_deref(),
            _ => None,
        }
    }

    pub fn is_pull_request(&self) -> bool {
        matches!(self, Self::PullRequest { .. })
    }
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PushToMain => write!(f, "push to main"),
            Self::PullRequest { number: Some(n) } => write!(f, "pull request #{}", n),
            Self::PullRequest { number: None } => write!(f, "pull request"),
            Self::ManualDispatch { .. } => write!(f, "manual dispatch"),
        }
    }
}

/// A single pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    Checkout,
    ConfirmGate,
    Authenticate,
    InstallTool,
    FormatCheck,
    Init,
    Validate,
    Plan,
    PublishPlan,
    Apply,
    ShowOutputs,
    PlanDestroy,
    ApplyDestroy,
    ReportSuccess,
}

impl StepKind {
    /// Name of the executor that runs this step
    pub fn executor_name(&self) -> &'static str {
        match self {
            Self::Checkout => "workspace",
            Self::ConfirmGate => "gate",
            Self::Authenticate => "credentials",
            Self::InstallTool => "setup",
            Self::FormatCheck
            | Self::Init
            | Self::Validate
            | Self::Plan
            | Self::Apply
            | Self::ShowOutputs
            | Self::PlanDestroy
            | Self::ApplyDestroy => "terraform",
            Self::PublishPlan => "publish",
            Self::ReportSuccess => "report",
        }
    }

    /// Whether this step changes real infrastructure
    pub fn is_mutating(&self) -> bool {
        matches!(self, Self::Apply | Self::ApplyDestroy)
    }
}

impl std::fmt::Display for StepKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Checkout => "checkout",
            Self::ConfirmGate => "confirm-gate",
            Self::Authenticate => "authenticate",
            Self::InstallTool => "install-tool",
            Self::FormatCheck => "format-check",
            Self::Init => "init",
            Self::Validate => "validate",
            Self::Plan => "plan",
            Self::PublishPlan => "publish-plan",
            Self::Apply => "apply",
            Self::ShowOutputs => "show-outputs",
            Self::PlanDestroy => "plan-destroy",
            Self::ApplyDestroy => "apply-destroy",
            Self::ReportSuccess => "report-success",
        };
        f.write_str(name)
    }
}

/// Which of the two pipelines to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineKind {
    Deploy,
    Destroy,
}

impl std::fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deploy => write!(f, "deploy"),
            Self::Destroy => write!(f, "destroy"),
        }
    }
}

impl std::str::FromStr for PipelineKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "deploy" => Ok(Self::Deploy),
            "destroy" => Ok(Self::Destroy),
            _ => Err(format!("Unknown pipeline: {}", s)),
        }
    }
}

const DEPLOY_PREFIX: &[StepKind] = &[
    StepKind::Checkout,
    StepKind::Authenticate,
    StepKind::InstallTool,
    StepKind::FormatCheck,
    StepKind::Init,
    StepKind::Validate,
    StepKind::Plan,
];

const DEPLOY_PUBLISH_TAIL: &[StepKind] = &[StepKind::PublishPlan];

const DEPLOY_APPLY_TAIL: &[StepKind] = &[StepKind::Apply, StepKind::ShowOutputs];

const DESTROY_STEPS: &[StepKind] = &[
    StepKind::Checkout,
    StepKind::ConfirmGate,
    StepKind::Authenticate,
    StepKind::InstallTool,
    StepKind::Init,
    StepKind::PlanDestroy,
    StepKind::ApplyDestroy,
    StepKind::ReportSuccess,
];

/// A resolved pipeline: its kind and the concrete step order for one trigger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    pub kind: PipelineKind,
    pub steps: Vec<StepKind>,
}

impl Pipeline {
    /// Resolve the step order for a pipeline and trigger
    pub fn resolve(kind: PipelineKind, trigger: &Trigger) -> Self {
        let steps = match kind {
            PipelineKind::Deploy => {
                let tail = match select_branch(trigger) {
                    Branch::PublishPlan => DEPLOY_PUBLISH_TAIL,
                    Branch::Apply => DEPLOY_APPLY_TAIL,
                };
                DEPLOY_PREFIX.iter().chain(tail).copied().collect()
            }
            PipelineKind::Destroy => DESTROY_STEPS.to_vec(),
        };

        Self { kind, steps }
    }

    /// Deploy pipeline for a trigger
    pub fn deploy(trigger: &Trigger) -> Self {
        Self::resolve(PipelineKind::Deploy, trigger)
    }

    /// Destroy pipeline
    pub fn destroy() -> Self {
        Self {
            kind: PipelineKind::Destroy,
            steps: DESTROY_STEPS.to_vec(),
        }
    }

    /// Position of a step, if the pipeline contains it
    pub fn position(&self, step: StepKind) -> Option<usize> {
        self.steps.iter().position(|s| *s == step)
    }

    pub fn contains(&self, step: StepKind) -> bool {
        self.steps.contains(&step)
    }
}

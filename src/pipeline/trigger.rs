// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Trigger detection
//!
//! Works out which event started the run, from explicit CLI flags or from
//! the GitHub Actions environment (`GITHUB_EVENT_NAME`, `GITHUB_REF` and the
//! JSON payload at `GITHUB_EVENT_PATH`).

use std::path::Path;

use serde_json::Value;

use crate::errors::TfflowError;
use crate::pipeline::Trigger;

/// Event kind given on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Push,
    PullRequest,
    Dispatch,
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" => Ok(Self::Push),
            "pull-request" | "pull_request" | "pr" => Ok(Self::PullRequest),
            "dispatch" | "workflow_dispatch" | "manual" => Ok(Self::Dispatch),
            _ => Err(format!("Unknown event: {}", s)),
        }
    }
}

/// Trigger values given explicitly on the command line
#[derive(Debug, Clone, Default)]
pub struct TriggerOverride {
    pub event: Option<EventKind>,
    pub pr_number: Option<u64>,
    pub confirmation: Option<String>,
}

/// Resolve the trigger for this run.
///
/// An explicit `--event` wins over the environment. An explicit
/// confirmation or PR number replaces whatever the payload carried.
pub fn resolve<F>(
    overrides: &TriggerOverride,
    lookup: F,
    main_branch: &str,
) -> Result<Trigger, TfflowError>
where
    F: Fn(&str) -> Option<String>,
{
    let detected = match overrides.event {
        Some(EventKind::Push) => Trigger::PushToMain,
        Some(EventKind::PullRequest) => Trigger::PullRequest { number: None },
        Some(EventKind::Dispatch) => Trigger::ManualDispatch { confirmation: None },
        None => from_github_env(&lookup, main_branch)?,
    };

    let trigger = match detected {
        Trigger::PullRequest { number } => Trigger::PullRequest {
            number: overrides.pr_number.or(number),
        },
        Trigger::ManualDispatch { confirmation } => Trigger::ManualDispatch {
            confirmation: overrides.confirmation.clone().or(confirmation),
        },
        Trigger::PushToMain => Trigger::PushToMain,
    };

    tracing::debug!(event = trigger.event_name(), "resolved trigger: {}", trigger);
    Ok(trigger)
}

/// Detect the trigger from GitHub Actions environment variables
pub fn from_github_env<F>(lookup: &F, main_branch: &str) -> Result<Trigger, TfflowError>
where
    F: Fn(&str) -> Option<String>,
{
    let event_name = lookup("GITHUB_EVENT_NAME").ok_or_else(|| TfflowError::UnsupportedTrigger {
        reason: "GITHUB_EVENT_NAME is not set; pass --event outside CI".to_string(),
    })?;

    let payload = match lookup("GITHUB_EVENT_PATH") {
        Some(path) => read_payload(Path::new(&path))?,
        None => Value::Null,
    };

    match event_name.as_str() {
        "push" => {
            let git_ref = lookup("GITHUB_REF").unwrap_or_default();
            let expected = format!("refs/heads/{}", main_branch);
            if git_ref == expected {
                Ok(Trigger::PushToMain)
            } else {
                Err(TfflowError::UnsupportedTrigger {
                    reason: format!("push to '{}' (only {} deploys)", git_ref, expected),
                })
            }
        }
        "pull_request" | "pull_request_target" => {
            let number = pull_request_number(&payload)
                .or_else(|| lookup("GITHUB_REF").as_deref().and_then(pr_number_from_ref));
            Ok(Trigger::PullRequest { number })
        }
        "workflow_dispatch" => {
            let confirmation = payload
                .pointer("/inputs/confirm")
                .and_then(Value::as_str)
                .map(str::to_string);
            Ok(Trigger::ManualDispatch { confirmation })
        }
        other => Err(TfflowError::UnsupportedTrigger {
            reason: format!("event '{}'", other),
        }),
    }
}

fn read_payload(path: &Path) -> Result<Value, TfflowError> {
    let content = std::fs::read_to_string(path).map_err(|e| TfflowError::FileReadError {
        path: path.to_path_buf(),
        error: e.to_string(),
    })?;
    serde_json::from_str(&content).map_err(Into::into)
}

fn pull_request_number(payload: &Value) -> Option<u64> {
    payload
        .pointer("/pull_request/number")
        .or_else(|| payload.get("number"))
        .and_then(Value::as_u64)
}

/// Parse `refs/pull/<n>/merge`
fn pr_number_from_ref(git_ref: &str) -> Option<u64> {
    git_ref
        .strip_prefix("refs/pull/")?
        .split('/')
        .next()?
        .parse()
        .ok()
}

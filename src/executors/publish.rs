// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Publish executor
//!
//! Posts the captured plan as a pull-request comment, or prints it when no
//! GitHub context is available.

use async_trait::async_trait;
use octocrab::Octocrab;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;

use super::{ExecutionResult, Executor, RunContext};
use crate::config::DeployConfig;
use crate::errors::TfflowError;
use crate::pipeline::{StepKind, Trigger};

/// GitHub caps comment bodies at 65 536 characters; leave room for the frame.
const MAX_PLAN_CHARS: usize = 60_000;

/// API root used when `GITHUB_API_URL` is unset
const DEFAULT_API_URL: &str = "https://api.github.com";

/// Repository to comment on
#[derive(Debug, Clone)]
pub struct GitHubRepo {
    pub token: String,
    pub owner: String,
    pub repo: String,
    /// REST API root; differs from the default on GitHub Enterprise Server
    pub api_url: String,
}

/// Where the plan goes
#[derive(Debug, Clone, Default)]
pub struct PublishTarget {
    /// Comment target; printed to stdout when unset
    pub github: Option<GitHubRepo>,
    /// Job summary file to append the comment to
    pub step_summary: Option<PathBuf>,
}

impl PublishTarget {
    /// Build a target from an environment snapshot
    pub fn from_env(env: &HashMap<String, String>) -> Self {
        let api_url = env
            .get("GITHUB_API_URL")
            .filter(|url| !url.is_empty())
            .cloned()
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let github = match (env.get("GITHUB_TOKEN"), env.get("GITHUB_REPOSITORY")) {
            (Some(token), Some(repository)) if !token.is_empty() => repository
                .split_once('/')
                .map(|(owner, repo)| GitHubRepo {
                    token: token.clone(),
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    api_url: api_url.clone(),
                }),
            _ => None,
        };

        Self {
            github,
            step_summary: env.get("GITHUB_STEP_SUMMARY").map(PathBuf::from),
        }
    }

    /// Build a target from the process environment
    pub fn from_process_env() -> Self {
        Self::from_env(&std::env::vars().collect())
    }
}

/// Render the plan comment body
pub fn render_comment(stack: &str, ctx: &RunContext) -> String {
    let mut body = String::new();

    let _ = writeln!(body, "### Terraform plan for `{}`", stack);
    let _ = writeln!(body);
    let _ = writeln!(body, "| Step | Outcome |");
    let _ = writeln!(body, "|------|---------|");
    for (step, passed) in &ctx.completed {
        let outcome = if *passed { "✅ success" } else { "❌ failure" };
        let _ = writeln!(body, "| {} | {} |", step, outcome);
    }
    let _ = writeln!(body);

    match &ctx.plan {
        Some(plan) => {
            let summary = plan
                .summary
                .map(|s| s.to_string())
                .unwrap_or_else(|| "summary unavailable".to_string());
            let _ = writeln!(body, "**Plan:** {}", summary);
            let _ = writeln!(body, "**Digest:** `{}`", plan.short_digest());
            let _ = writeln!(body);
            let _ = writeln!(body, "<details><summary>Show plan</summary>");
            let _ = writeln!(body);
            let _ = writeln!(body, "```terraform");
            let _ = writeln!(body, "{}", truncate_plan(plan.text.trim_end()));
            let _ = writeln!(body, "```");
            let _ = writeln!(body);
            let _ = writeln!(body, "</details>");
        }
        None => {
            let _ = writeln!(body, "_No plan was captured._");
        }
    }

    let _ = writeln!(body);
    let _ = write!(body, "*Triggered by {}*", ctx.trigger);

    body
}

/// Keep the tail of long plans; the summary line is at the end.
fn truncate_plan(text: &str) -> String {
    let total = text.chars().count();
    if total <= MAX_PLAN_CHARS {
        return text.to_string();
    }

    let omitted = total - MAX_PLAN_CHARS;
    let tail: String = text.chars().skip(omitted).collect();
    format!("... ({} characters omitted)\n{}", omitted, tail)
}

/// What stops the plan from being posted as a comment
fn missing_context(has_github: bool, has_number: bool) -> &'static str {
    match (has_github, has_number) {
        (false, true) => "GITHUB_TOKEN or GITHUB_REPOSITORY not set",
        (true, false) => "no pull request number",
        _ => "no pull request number and no GitHub token",
    }
}

/// Publish executor
pub struct PublishExecutor {
    config: Arc<DeployConfig>,
    target: PublishTarget,
}

impl PublishExecutor {
    /// Create a new publish executor
    pub fn new(config: Arc<DeployConfig>, target: PublishTarget) -> Self {
        Self { config, target }
    }

    async fn post_comment(
        &self,
        github: &GitHubRepo,
        number: u64,
        body: &str,
    ) -> Result<String, TfflowError> {
        let failure = |e: octocrab::Error| TfflowError::PublishFailure {
            reason: e.to_string(),
            help: Some("The token needs 'pull-requests: write' permission".into()),
        };

        let octocrab = Octocrab::builder()
            .base_uri(github.api_url.as_str())
            .map_err(failure)?
            .personal_token(github.token.clone())
            .build()
            .map_err(failure)?;

        let comment = octocrab
            .issues(&github.owner, &github.repo)
            .create_comment(number, body)
            .await
            .map_err(failure)?;

        Ok(comment.html_url.to_string())
    }

    async fn append_step_summary(&self, path: &Path, body: &str) -> Result<(), TfflowError> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(|e| TfflowError::FileWriteError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })?;

        file.write_all(format!("{}\n", body).as_bytes())
            .await
            .map_err(|e| TfflowError::FileWriteError {
                path: path.to_path_buf(),
                error: e.to_string(),
            })
    }
}

#[async_trait]
impl Executor for PublishExecutor {
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError> {
        if step != StepKind::PublishPlan {
            return Err(TfflowError::ExecutorNotFound {
                name: format!("publish/{}", step),
            });
        }

        let start = Instant::now();

        if !self.config.publish.enabled {
            tracing::info!("plan publishing disabled");
            return Ok(ExecutionResult::success(
                "publishing disabled".into(),
                start.elapsed(),
            ));
        }

        let body = render_comment(&self.config.name, ctx);

        if let Some(path) = &self.target.step_summary {
            self.append_step_summary(path, &body).await?;
        }

        let number = match &ctx.trigger {
            Trigger::PullRequest { number } => *number,
            _ => None,
        };

        let summary = match (&self.target.github, number) {
            (Some(github), Some(number)) => {
                let url = self.post_comment(github, number, &body).await?;
                tracing::info!(pr = number, url = %url, "plan comment posted");
                format!("plan published to {}", url)
            }
            (github, number) => {
                let missing = missing_context(github.is_some(), number.is_some());
                tracing::info!("{}; printing plan comment", missing);
                println!("{}", body);
                format!("plan printed to stdout ({})", missing)
            }
        };

        Ok(ExecutionResult::success(summary, start.elapsed()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executors::mock_http;
    use crate::executors::CapturedPlan;

    const COMMENT_RESPONSE: &str = r#"{
        "id": 1,
        "node_id": "MDEyOklzc3VlQ29tbWVudDE=",
        "url": "https://api.github.com/repos/acme/network/issues/comments/1",
        "html_url": "https://github.com/acme/network/pull/7#issuecomment-1",
        "issue_url": "https://api.github.com/repos/acme/network/issues/7",
        "body": "plan",
        "author_association": "NONE",
        "user": {
            "login": "github-actions[bot]",
            "id": 41898282,
            "node_id": "MDM6Qm90NDE4OTgyODI=",
            "avatar_url": "https://avatars.githubusercontent.com/in/15368?v=4",
            "gravatar_id": "",
            "url": "https://api.github.com/users/github-actions%5Bbot%5D",
            "html_url": "https://github.com/apps/github-actions",
            "followers_url": "https://api.github.com/users/github-actions%5Bbot%5D/followers",
            "following_url": "https://api.github.com/users/github-actions%5Bbot%5D/following",
            "gists_url": "https://api.github.com/users/github-actions%5Bbot%5D/gists",
            "starred_url": "https://api.github.com/users/github-actions%5Bbot%5D/starred",
            "subscriptions_url": "https://api.github.com/users/github-actions%5Bbot%5D/subscriptions",
            "organizations_url": "https://api.github.com/users/github-actions%5Bbot%5D/orgs",
            "repos_url": "https://api.github.com/users/github-actions%5Bbot%5D/repos",
            "events_url": "https://api.github.com/users/github-actions%5Bbot%5D/events",
            "received_events_url": "https://api.github.com/users/github-actions%5Bbot%5D/received_events",
            "type": "Bot",
            "site_admin": false
        },
        "created_at": "2025-01-01T00:00:00Z",
        "updated_at": "2025-01-01T00:00:00Z"
    }"#;

    const FORBIDDEN_RESPONSE: &str = r#"{
        "message": "Resource not accessible by integration",
        "documentation_url": "https://docs.github.com/rest"
    }"#;

    fn github_at(api_url: String) -> PublishTarget {
        PublishTarget {
            github: Some(GitHubRepo {
                token: "ghs_test".into(),
                owner: "acme".into(),
                repo: "network".into(),
                api_url,
            }),
            step_summary: None,
        }
    }

    fn pr_context() -> RunContext {
        let mut ctx = RunContext::new(Trigger::PullRequest { number: Some(7) }, ".".into());
        ctx.completed = vec![
            (StepKind::FormatCheck, true),
            (StepKind::Init, true),
            (StepKind::Validate, true),
            (StepKind::Plan, true),
        ];
        ctx.plan = Some(CapturedPlan::capture(
            "  # aws_vpc.this will be created\nPlan: 3 to add, 0 to change, 0 to destroy.\n".into(),
            None,
        ));
        ctx
    }

    #[test]
    fn test_render_comment() {
        let body = render_comment("vpc", &pr_context());
        assert!(body.starts_with("### Terraform plan for `vpc`"));
        assert!(body.contains("| format-check | ✅ success |"));
        assert!(body.contains("**Plan:** 3 to add, 0 to change, 0 to destroy"));
        assert!(body.contains("aws_vpc.this will be created"));
        assert!(body.ends_with("*Triggered by pull request #7*"));
    }

    #[test]
    fn test_render_without_plan() {
        let ctx = RunContext::new(Trigger::PullRequest { number: None }, ".".into());
        let body = render_comment("vpc", &ctx);
        assert!(body.contains("_No plan was captured._"));
    }

    #[test]
    fn test_truncate_keeps_tail() {
        let text = format!(
            "{}Plan: 1 to add, 0 to change, 0 to destroy.",
            "x".repeat(MAX_PLAN_CHARS)
        );
        let truncated = truncate_plan(&text);
        assert!(truncated.starts_with("... ("));
        assert!(truncated.ends_with("0 to destroy."));
        assert!(truncated.chars().count() < MAX_PLAN_CHARS + 100);
    }

    #[test]
    fn test_target_from_env() {
        let env: HashMap<String, String> = [
            ("GITHUB_TOKEN", "ghs_token"),
            ("GITHUB_REPOSITORY", "acme/network"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let target = PublishTarget::from_env(&env);
        let github = target.github.unwrap();
        assert_eq!(github.owner, "acme");
        assert_eq!(github.repo, "network");
        assert_eq!(github.api_url, "https://api.github.com");
        assert!(target.step_summary.is_none());
    }

    #[test]
    fn test_target_uses_enterprise_api_url() {
        let env: HashMap<String, String> = [
            ("GITHUB_TOKEN", "ghs_token"),
            ("GITHUB_REPOSITORY", "acme/network"),
            ("GITHUB_API_URL", "https://ghe.acme.internal/api/v3"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let github = PublishTarget::from_env(&env).github.unwrap();
        assert_eq!(github.api_url, "https://ghe.acme.internal/api/v3");
    }

    #[test]
    fn test_missing_context_names_what_is_absent() {
        assert_eq!(
            missing_context(false, true),
            "GITHUB_TOKEN or GITHUB_REPOSITORY not set"
        );
        assert_eq!(missing_context(true, false), "no pull request number");
    }

    #[tokio::test]
    async fn test_publish_posts_pull_request_comment() {
        let (api_url, mut requests) = mock_http::serve(201, COMMENT_RESPONSE).await;
        let executor =
            PublishExecutor::new(Arc::new(DeployConfig::starter("vpc")), github_at(api_url));
        let mut ctx = pr_context();

        let result = executor.execute(StepKind::PublishPlan, &mut ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(
            result.stdout,
            "plan published to https://github.com/acme/network/pull/7#issuecomment-1"
        );

        let request = requests.recv().await.unwrap();
        assert!(request
            .request_line
            .starts_with("POST /repos/acme/network/issues/7/comments "));
        assert!(request.headers.contains("ghs_test"));
        assert!(request.body.contains("Terraform plan for `vpc`"));
        assert!(request.body.contains("3 to add, 0 to change, 0 to destroy"));
    }

    #[tokio::test]
    async fn test_publish_rejected_comment_fails() {
        let (api_url, _requests) = mock_http::serve(403, FORBIDDEN_RESPONSE).await;
        let executor =
            PublishExecutor::new(Arc::new(DeployConfig::starter("vpc")), github_at(api_url));
        let mut ctx = pr_context();

        let err = executor
            .execute(StepKind::PublishPlan, &mut ctx)
            .await
            .unwrap_err();
        assert!(matches!(err, TfflowError::PublishFailure { .. }));
    }

    #[tokio::test]
    async fn test_publish_appends_step_summary() {
        let dir = tempfile::tempdir().unwrap();
        let summary = dir.path().join("summary.md");
        let target = PublishTarget {
            github: None,
            step_summary: Some(summary.clone()),
        };
        let executor = PublishExecutor::new(Arc::new(DeployConfig::starter("vpc")), target);
        let mut ctx = pr_context();

        let result = executor.execute(StepKind::PublishPlan, &mut ctx).await.unwrap();
        assert!(result.success);
        assert_eq!(
            result.stdout,
            "plan printed to stdout (GITHUB_TOKEN or GITHUB_REPOSITORY not set)"
        );

        let written = std::fs::read_to_string(summary).unwrap();
        assert!(written.contains("3 to add"));
    }

    #[tokio::test]
    async fn test_publish_disabled() {
        let mut config = DeployConfig::starter("vpc");
        config.publish.enabled = false;
        let executor = PublishExecutor::new(Arc::new(config), PublishTarget::default());
        let mut ctx = pr_context();

        let result = executor.execute(StepKind::PublishPlan, &mut ctx).await.unwrap();
        assert_eq!(result.stdout, "publishing disabled");
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Credentials executor
//!
//! Resolves AWS credentials (static keys or OIDC web identity) and exports
//! them, with the region, to every later step.

use async_trait::async_trait;
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use std::time::Instant;

use super::{ExecutionResult, Executor, RunContext};
use crate::config::DeployConfig;
use crate::errors::TfflowError;
use crate::pipeline::StepKind;

/// Audience AWS STS expects on web identity tokens
const STS_AUDIENCE: &str = "sts.amazonaws.com";

fn access_key_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(AKIA|ASIA)[A-Z0-9]{16}$").expect("access key regex is valid"))
}

fn role_arn_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^arn:aws[a-z-]*:iam::\d{12}:role/[\w+=,.@/-]+$")
            .expect("role ARN regex is valid")
    })
}

/// AWS credentials for the run
#[derive(Clone, PartialEq, Eq)]
pub enum AwsCredentials {
    /// Long-lived access key pair from repository secrets
    Static {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
    },
    /// Role assumed with the CI platform's OIDC token
    WebIdentity { role_arn: String, session_name: String },
}

impl std::fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Static { access_key_id, session_token, .. } => f
                .debug_struct("Static")
                .field("access_key_id", &mask(access_key_id))
                .field("secret_access_key", &"***")
                .field("session_token", &session_token.as_ref().map(|_| "***"))
                .finish(),
            Self::WebIdentity { role_arn, session_name } => f
                .debug_struct("WebIdentity")
                .field("role_arn", role_arn)
                .field("session_name", session_name)
                .finish(),
        }
    }
}

/// Keep the first four characters of an identifier
fn mask(value: &str) -> String {
    let prefix: String = value.chars().take(4).collect();
    format!("{}***", prefix)
}

impl AwsCredentials {
    /// Resolve credentials from config and environment.
    ///
    /// A role ARN (config first, then `AWS_ROLE_ARN`) selects web identity;
    /// otherwise the static key pair must be present.
    pub fn resolve<F>(config: &DeployConfig, lookup: F) -> Result<Self, TfflowError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let role_arn = config
            .aws
            .role_arn
            .clone()
            .or_else(|| non_empty("AWS_ROLE_ARN"));

        if let Some(role_arn) = role_arn {
            if !role_arn_regex().is_match(&role_arn) {
                return Err(TfflowError::CredentialFailure {
                    reason: format!("'{}' is not an IAM role ARN", role_arn),
                    help: Some("Expected arn:aws:iam::<account-id>:role/<name>".into()),
                });
            }
            return Ok(Self::WebIdentity {
                role_arn,
                session_name: config.aws.session_name.clone(),
            });
        }

        let access_key_id = non_empty("AWS_ACCESS_KEY_ID")
            .ok_or_else(|| TfflowError::missing_credential("AWS_ACCESS_KEY_ID"))?;
        let secret_access_key = non_empty("AWS_SECRET_ACCESS_KEY")
            .ok_or_else(|| TfflowError::missing_credential("AWS_SECRET_ACCESS_KEY"))?;

        if !access_key_regex().is_match(&access_key_id) {
            return Err(TfflowError::CredentialFailure {
                reason: format!("AWS_ACCESS_KEY_ID '{}' is malformed", mask(&access_key_id)),
                help: Some("Access key ids are 20 characters starting with AKIA or ASIA".into()),
            });
        }

        Ok(Self::Static {
            access_key_id,
            secret_access_key,
            session_token: non_empty("AWS_SESSION_TOKEN"),
        })
    }
}

/// Token endpoint response
#[derive(Debug, Deserialize)]
struct OidcToken {
    value: String,
}

/// Credentials executor
pub struct CredentialsExecutor {
    config: Arc<DeployConfig>,
    env: HashMap<String, String>,
}

impl CredentialsExecutor {
    /// Create an executor reading from an explicit environment snapshot
    pub fn new(config: Arc<DeployConfig>, env: HashMap<String, String>) -> Self {
        Self { config, env }
    }

    /// Create an executor reading from the process environment
    pub fn from_process_env(config: Arc<DeployConfig>) -> Self {
        Self::new(config, std::env::vars().collect())
    }

    fn lookup(&self, key: &str) -> Option<String> {
        self.env.get(key).cloned()
    }

    /// Obtain a web identity token file, fetching a fresh token when the
    /// CI token endpoint is available.
    async fn web_identity_token_file(&self) -> Result<PathBuf, TfflowError> {
        let endpoint = self.lookup("ACTIONS_ID_TOKEN_REQUEST_URL");
        let bearer = self.lookup("ACTIONS_ID_TOKEN_REQUEST_TOKEN");

        let (Some(endpoint), Some(bearer)) = (endpoint, bearer) else {
            if let Some(existing) = self.lookup("AWS_WEB_IDENTITY_TOKEN_FILE") {
                return Ok(PathBuf::from(existing));
            }
            return Err(TfflowError::CredentialFailure {
                reason: "no OIDC token endpoint available".into(),
                help: Some("Grant the job 'permissions: id-token: write'".into()),
            });
        };

        let token = fetch_oidc_token(&endpoint, &bearer).await?;

        let dir = self
            .lookup("RUNNER_TEMP")
            .map(PathBuf::from)
            .unwrap_or_else(std::env::temp_dir);
        let path = dir.join("tfflow-web-identity-token");
        tokio::fs::write(&path, token).await.map_err(|e| TfflowError::FileWriteError {
            path: path.clone(),
            error: e.to_string(),
        })?;

        Ok(path)
    }
}

async fn fetch_oidc_token(endpoint: &str, bearer: &str) -> Result<String, TfflowError> {
    let failure = |e: reqwest::Error| TfflowError::CredentialFailure {
        reason: format!("OIDC token request failed: {}", e),
        help: None,
    };

    let client = reqwest::Client::builder()
        .user_agent(format!("tfflow/{}", crate::VERSION))
        .timeout(std::time::Duration::from_secs(10))
        .build()
        .map_err(failure)?;

    let token: OidcToken = client
        .get(endpoint)
        .query(&[("audience", STS_AUDIENCE)])
        .bearer_auth(bearer)
        .send()
        .await
        .map_err(failure)?
        .error_for_status()
        .map_err(failure)?
        .json()
        .await
        .map_err(failure)?;

    Ok(token.value)
}

#[async_trait]
impl Executor for CredentialsExecutor {
    async fn execute(
        &self,
        step: StepKind,
        ctx: &mut RunContext,
    ) -> Result<ExecutionResult, TfflowError> {
        if step != StepKind::Authenticate {
            return Err(TfflowError::ExecutorNotFound {
                name: format!("credentials/{}", step),
            });
        }

        let start = Instant::now();
        let credentials = AwsCredentials::resolve(&self.config, |k| self.lookup(k))?;
        tracing::info!(
            credentials = ?credentials,
            region = %self.config.aws.region,
            "authenticating"
        );

        let region = &self.config.aws.region;
        ctx.env.insert("AWS_REGION".into(), region.clone());
        ctx.env.insert("AWS_DEFAULT_REGION".into(), region.clone());

        let summary = match credentials {
            AwsCredentials::Static {
                access_key_id,
                secret_access_key,
                session_token,
            } => {
                let summary = format!("static key {}", mask(&access_key_id));
                ctx.env.insert("AWS_ACCESS_KEY_ID".into(), access_key_id);
                ctx.env.insert("AWS_SECRET_ACCESS_KEY".into(), secret_access_key);
                if let Some(token) = session_token {
                    ctx.env.insert("AWS_SESSION_TOKEN".into(), token);
                }
                summary
            }
            AwsCredentials::WebIdentity { role_arn, session_name } => {
                let token_file = self.web_identity_token_file().await?;
                let summary = format!("role {}", role_arn);
                ctx.env.insert("AWS_ROLE_ARN".into(), role_arn);
                ctx.env.insert("AWS_ROLE_SESSION_NAME".into(), session_name);
                ctx.env.insert(
                    "AWS_WEB_IDENTITY_TOKEN_FILE".into(),
                    token_file.to_string_lossy().to_string(),
                );
                summary
            }
        };

        Ok(ExecutionResult::success(
            format!("{} in {}", summary, region),
            start.elapsed(),
        ))
    }
}

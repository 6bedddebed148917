// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Error types
//!
//! Every error is fatal to a run. Variants carry a diagnostic code and,
//! where one exists, a hint about what to do next.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

use crate::pipeline::StepKind;

/// Result type for tfflow operations
pub type TfflowResult<T> = Result<T, TfflowError>;

/// Main error type for tfflow
#[derive(Error, Debug, Diagnostic)]
pub enum TfflowError {
    // ─────────────────────────────────────────────────────────────────────────
    // Run Failures
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Destroy confirmation mismatch: expected '{expected}', got '{received}'")]
    #[diagnostic(
        code(tfflow::confirmation_mismatch),
        help("Re-run the destroy workflow and type '{expected}' exactly (lowercase) in the confirmation input")
    )]
    ConfirmationMismatch { expected: String, received: String },

    #[error("Workspace checkout failed: {reason}")]
    #[diagnostic(code(tfflow::checkout_failure))]
    CheckoutFailure {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("AWS credential configuration failed: {reason}")]
    #[diagnostic(code(tfflow::credential_failure))]
    CredentialFailure {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Terraform setup failed: {reason}")]
    #[diagnostic(code(tfflow::tool_install_failure))]
    ToolInstallFailure {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("Terraform files are not formatted")]
    #[diagnostic(
        code(tfflow::format_violation),
        help("Run 'terraform fmt -recursive' and commit the result")
    )]
    FormatViolation { files: String },

    #[error("terraform init failed: {reason}")]
    #[diagnostic(
        code(tfflow::init_failure),
        help("Check the backend_config values and that the state bucket and lock table exist")
    )]
    InitFailure { reason: String },

    #[error("terraform validate failed: {reason}")]
    #[diagnostic(code(tfflow::validation_failure))]
    ValidationFailure { reason: String },

    #[error("terraform plan failed: {reason}")]
    #[diagnostic(code(tfflow::plan_failure))]
    PlanFailure { reason: String },

    #[error("terraform apply failed: {reason}")]
    #[diagnostic(
        code(tfflow::apply_failure),
        help("Infrastructure may be partially changed; inspect the state before re-running")
    )]
    ApplyFailure { reason: String },

    #[error("Publishing the plan failed: {reason}")]
    #[diagnostic(code(tfflow::publish_failure))]
    PublishFailure {
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Trigger Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Unsupported trigger: {reason}")]
    #[diagnostic(
        code(tfflow::unsupported_trigger),
        help("Deploy runs on push to the main branch, pull requests or manual dispatch; destroy runs only on manual dispatch")
    )]
    UnsupportedTrigger { reason: String },

    // ─────────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Configuration file not found: {path}")]
    #[diagnostic(
        code(tfflow::config_not_found),
        help("Create one with 'tfflow init'")
    )]
    ConfigNotFound { path: PathBuf },

    #[error("Invalid configuration: {reason}")]
    #[diagnostic(code(tfflow::invalid_config))]
    InvalidConfig {
        reason: String,
        #[help]
        help: Option<String>,
    },

    #[error("No executor registered for '{name}'")]
    #[diagnostic(code(tfflow::executor_not_found))]
    ExecutorNotFound { name: String },

    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(tfflow::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(tfflow::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(tfflow::io_error))]
    Io { message: String },

    #[error("YAML parsing error: {message}")]
    #[diagnostic(code(tfflow::yaml_error))]
    Yaml { message: String },

    #[error("JSON parsing error: {message}")]
    #[diagnostic(code(tfflow::json_error))]
    Json { message: String },

    #[error("TOML parsing error: {message}")]
    #[diagnostic(code(tfflow::toml_error))]
    Toml { message: String },
}

impl From<std::io::Error> for TfflowError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for TfflowError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for TfflowError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl From<toml::de::Error> for TfflowError {
    fn from(e: toml::de::Error) -> Self {
        Self::Toml { message: e.to_string() }
    }
}

impl TfflowError {
    /// Build the run failure for a step that did not pass.
    ///
    /// The step kind decides the variant; `reason` is whatever the step
    /// reported (usually the tool's stderr).
    pub fn for_failed_step(step: StepKind, reason: String) -> Self {
        match step {
            StepKind::Checkout => Self::CheckoutFailure { reason, help: None },
            StepKind::ConfirmGate => Self::ConfirmationMismatch {
                expected: crate::pipeline::DESTROY_SENTINEL.to_string(),
                received: reason,
            },
            StepKind::Authenticate => Self::CredentialFailure { reason, help: None },
            StepKind::InstallTool => Self::ToolInstallFailure { reason, help: None },
            StepKind::FormatCheck => Self::FormatViolation { files: reason },
            StepKind::Init => Self::InitFailure { reason },
            StepKind::Validate => Self::ValidationFailure { reason },
            StepKind::Plan | StepKind::PlanDestroy => Self::PlanFailure { reason },
            StepKind::Apply
            | StepKind::ApplyDestroy
            | StepKind::ShowOutputs
            | StepKind::ReportSuccess => Self::ApplyFailure { reason },
            StepKind::PublishPlan => Self::PublishFailure { reason, help: None },
        }
    }

    /// Create a credential error with a hint for the CI secrets setup
    pub fn missing_credential(variable: &str) -> Self {
        Self::CredentialFailure {
            reason: format!("{} is not set", variable),
            help: Some(format!(
                "Add {} as a repository secret and expose it to the job, or configure aws.role_arn for OIDC",
                variable
            )),
        }
    }

    /// Create a setup error for a missing terraform binary
    pub fn terraform_not_found() -> Self {
        Self::ToolInstallFailure {
            reason: "terraform binary not found in PATH".to_string(),
            help: Some(
                "Install Terraform (https://developer.hashicorp.com/terraform/install) or set terraform.path"
                    .to_string(),
            ),
        }
    }

    /// Whether this error means infrastructure may have been touched
    pub fn may_have_mutated(&self) -> bool {
        matches!(self, Self::ApplyFailure { .. })
    }
}

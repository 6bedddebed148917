// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Recovery suggestions
//!
//! Concrete next steps printed after a failed run.

use super::TfflowError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for a run failure, if one applies
    pub fn for_error(error: &TfflowError) -> Option<Self> {
        if error.may_have_mutated() {
            return Some(Self::inspect_state());
        }

        match error {
            TfflowError::ConfirmationMismatch { expected, .. } => {
                Some(Self::retype_confirmation(expected))
            }
            TfflowError::FormatViolation { .. } => Some(Self::format_sources()),
            TfflowError::ToolInstallFailure { .. } => Some(Self::install_terraform()),
            TfflowError::CredentialFailure { .. } => Some(Self::configure_credentials()),
            TfflowError::ConfigNotFound { .. } => Some(Self::create_config()),
            _ => None,
        }
    }

    /// Suggest re-running destroy with the right confirmation
    pub fn retype_confirmation(expected: &str) -> Self {
        Self {
            action: "Confirm the destroy explicitly".into(),
            steps: vec![
                format!("The confirmation must be exactly '{}'", expected),
                "The comparison is case-sensitive and ignores nothing (no trimming)".into(),
                "No infrastructure was touched by this run".into(),
            ],
            commands: vec![format!("tfflow destroy --confirm {}", expected)],
        }
    }

    /// Suggest formatting the Terraform sources
    pub fn format_sources() -> Self {
        Self {
            action: "Format the Terraform sources".into(),
            steps: vec!["terraform fmt -check reported unformatted files".into()],
            commands: vec![
                "terraform fmt -recursive".into(),
                "git commit -am \"terraform fmt\"".into(),
            ],
        }
    }

    /// Suggest installing the pinned terraform
    pub fn install_terraform() -> Self {
        Self {
            action: "Install the pinned Terraform version".into(),
            steps: vec![
                "terraform must be on PATH or configured as terraform.path".into(),
                "When terraform.version is set, the installed version must match it".into(),
            ],
            commands: vec![
                "# Using tfenv:".into(),
                "tfenv install && tfenv use".into(),
                "".into(),
                "# Check the active version:".into(),
                "terraform version".into(),
            ],
        }
    }

    /// Suggest setting up AWS credentials
    pub fn configure_credentials() -> Self {
        Self {
            action: "Provide AWS credentials".into(),
            steps: vec![
                "Static keys: set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY".into(),
                "OIDC: set aws.role_arn and grant the job 'id-token: write'".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest creating a configuration file
    pub fn create_config() -> Self {
        Self {
            action: "Create a tfflow configuration".into(),
            steps: vec!["No .tfflow.yaml found in the current directory".into()],
            commands: vec!["tfflow init --name vpc".into()],
        }
    }

    /// Suggest inspecting state after a failed apply
    pub fn inspect_state() -> Self {
        Self {
            action: "Inspect Terraform state before re-running".into(),
            steps: vec![
                "Apply stopped part way; some resources may already exist".into(),
                "A stale lock may remain in the lock table".into(),
            ],
            commands: vec![
                "terraform state list".into(),
                "terraform force-unlock <LOCK_ID>".into(),
            ],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::StepKind;

    #[test]
    fn test_confirmation_mismatch_has_suggestion() {
        let err = TfflowError::ConfirmationMismatch {
            expected: "destroy".into(),
            received: "yes".into(),
        };
        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        let text = suggestion.to_string();
        assert!(text.contains("tfflow destroy --confirm destroy"));
        assert!(text.contains("No infrastructure was touched"));
    }

    #[test]
    fn test_failed_apply_suggests_inspecting_state() {
        let err = TfflowError::for_failed_step(StepKind::ApplyDestroy, "lock held".into());
        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        assert_eq!(suggestion.action, "Inspect Terraform state before re-running");
        assert!(suggestion.commands.contains(&"terraform state list".to_string()));
    }

    #[test]
    fn test_plan_failure_has_no_suggestion() {
        let err = TfflowError::PlanFailure { reason: "boom".into() };
        assert!(RecoverySuggestion::for_error(&err).is_none());
    }
}

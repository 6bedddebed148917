// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Configuration validation
//!
//! Validates a deployment configuration before any step runs.

use std::path::Path;

use crate::config::DeployConfig;
use crate::errors::TfflowError;

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration values that need no filesystem access
    pub fn validate(config: &DeployConfig) -> ValidationResult {
        let mut result = ValidationResult::new();

        if config.name.trim().is_empty() {
            result.add_error("Stack name is empty");
        }

        if config.aws.region.trim().is_empty() {
            result.add_error("aws.region is empty");
        }

        if config.main_branch.trim().is_empty() {
            result.add_error("main_branch is empty");
        }

        for (field, file) in [
            ("terraform.plan_file", &config.terraform.plan_file),
            ("terraform.destroy_plan_file", &config.terraform.destroy_plan_file),
        ] {
            if let Some(file) = file {
                if file.is_empty() {
                    result.add_error(&format!(
                        "{} is empty; use null to plan without a file",
                        field
                    ));
                } else if Path::new(file).is_absolute() {
                    result.add_error(&format!(
                        "{} must be relative to the working directory: {}",
                        field, file
                    ));
                }
            }
        }

        if let (Some(plan), Some(destroy)) = (
            &config.terraform.plan_file,
            &config.terraform.destroy_plan_file,
        ) {
            if plan == destroy {
                result.add_warning(&format!(
                    "plan_file and destroy_plan_file are both '{}'",
                    plan
                ));
            }
        }

        if config.terraform.version.is_none() {
            result.add_warning(
                "terraform.version is not pinned; any installed version will be used",
            );
        }

        if config.terraform.backend_config.is_empty() {
            result.add_warning(
                "terraform.backend_config is empty; init will use the backend block as written",
            );
        } else if !config.terraform.backend_config.contains_key("dynamodb_table")
            && !config.terraform.backend_config.contains_key("use_lockfile")
        {
            result.add_warning(
                "Backend has no lock table; concurrent runs can race on the same state",
            );
        }

        result
    }

    /// Check that referenced files exist (runtime validation)
    pub fn validate_files(
        config: &DeployConfig,
        repo_root: &Path,
    ) -> Result<Vec<String>, TfflowError> {
        let mut missing = Vec::new();
        let working_dir = config.resolve_working_dir(repo_root);

        if !working_dir.is_dir() {
            missing.push(format!(
                "Working directory not found: {}",
                working_dir.display()
            ));
            return Ok(missing);
        }

        if crate::executors::terraform_sources(&working_dir)?.is_empty() {
            missing.push(format!(
                "No *.tf files in working directory: {}",
                working_dir.display()
            ));
        }

        for var_file in &config.terraform.var_files {
            if !working_dir.join(var_file).exists() {
                missing.push(format!("Var file not found: {}", var_file.display()));
            }
        }

        if let Some(path) = &config.terraform.path {
            if !path.exists() {
                missing.push(format!("terraform.path not found: {}", path.display()));
            }
        }

        Ok(missing)
    }
}

/// Result of configuration validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starter_is_valid() {
        let result = ConfigValidator::validate(&DeployConfig::starter("vpc"));
        assert!(result.is_valid());
        assert!(!result.has_warnings());
    }

    #[test]
    fn test_empty_region_is_error() {
        let mut config = DeployConfig::starter("vpc");
        config.aws.region = String::new();

        let result = ConfigValidator::validate(&config);
        assert!(!result.is_valid());
        assert!(result.errors.iter().any(|e| e.contains("aws.region")));
    }

    #[test]
    fn test_absolute_plan_file_is_error() {
        let mut config = DeployConfig::starter("vpc");
        config.terraform.plan_file = Some("/tmp/tfplan".into());

        let result = ConfigValidator::validate(&config);
        assert!(result.errors.iter().any(|e| e.contains("terraform.plan_file")));
    }

    #[test]
    fn test_missing_lock_table_warns() {
        let mut config = DeployConfig::starter("vpc");
        config.terraform.backend_config.remove("dynamodb_table");

        let result = ConfigValidator::validate(&config);
        assert!(result.is_valid());
        assert!(result.warnings.iter().any(|w| w.contains("lock table")));
    }

    #[test]
    fn test_validate_files_reports_missing_sources() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("terraform")).unwrap();

        let config = DeployConfig::starter("vpc");
        let missing = ConfigValidator::validate_files(&config, dir.path()).unwrap();
        assert_eq!(missing.len(), 1);
        assert!(missing[0].contains("No *.tf files"));

        std::fs::write(dir.path().join("terraform/main.tf"), "").unwrap();
        let missing = ConfigValidator::validate_files(&config, dir.path()).unwrap();
        assert!(missing.is_empty());
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Deployment configuration
//!
//! Defines the schema for .tfflow.yaml (or .tfflow.toml) files.

mod validation;

pub use validation::{ConfigValidator, ValidationResult};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::errors::TfflowError;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = ".tfflow.yaml";

/// Deployment configuration from .tfflow.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployConfig {
    /// Config version (for future compatibility)
    #[serde(default = "default_version")]
    pub version: String,

    /// Stack name, used in comments and logs
    pub name: String,

    /// Directory holding the Terraform root module, relative to the repo root
    #[serde(default = "default_working_directory")]
    pub working_directory: PathBuf,

    /// Branch whose pushes trigger an apply
    #[serde(default = "default_main_branch")]
    pub main_branch: String,

    /// Terraform settings
    #[serde(default)]
    pub terraform: TerraformConfig,

    /// AWS settings
    pub aws: AwsConfig,

    /// Plan publishing settings
    #[serde(default)]
    pub publish: PublishConfig,

    /// Extra environment for every terraform invocation
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

fn default_version() -> String {
    "1".to_string()
}

fn default_working_directory() -> PathBuf {
    PathBuf::from("terraform")
}

fn default_main_branch() -> String {
    "main".to_string()
}

impl DeployConfig {
    /// Load configuration from a YAML or TOML file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, TfflowError> {
        if !path.exists() {
            return Err(TfflowError::ConfigNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| TfflowError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Self::from_toml(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self, TfflowError> {
        serde_yaml::from_str(yaml).map_err(Into::into)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, TfflowError> {
        toml::from_str(content).map_err(Into::into)
    }

    /// Serialize configuration to YAML
    pub fn to_yaml(&self) -> Result<String, TfflowError> {
        serde_yaml::to_string(self).map_err(Into::into)
    }

    /// Absolute working directory for terraform steps
    pub fn resolve_working_dir(&self, repo_root: &Path) -> PathBuf {
        if self.working_directory.is_absolute() {
            self.working_directory.clone()
        } else {
            repo_root.join(&self.working_directory)
        }
    }

    /// Starter configuration written by `tfflow init`
    pub fn starter(name: &str) -> Self {
        let mut backend_config = BTreeMap::new();
        backend_config.insert("bucket".to_string(), format!("{}-terraform-state", name));
        backend_config.insert("key".to_string(), format!("{}/terraform.tfstate", name));
        backend_config.insert("region".to_string(), "us-east-1".to_string());
        backend_config.insert(
            "dynamodb_table".to_string(),
            format!("{}-terraform-locks", name),
        );

        Self {
            version: default_version(),
            name: name.to_string(),
            working_directory: default_working_directory(),
            main_branch: default_main_branch(),
            terraform: TerraformConfig {
                version: Some("1.6.6".to_string()),
                backend_config,
                ..TerraformConfig::default()
            },
            aws: AwsConfig {
                region: "us-east-1".to_string(),
                role_arn: None,
                session_name: default_session_name(),
            },
            publish: PublishConfig::default(),
            env: BTreeMap::new(),
        }
    }
}

/// Terraform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformConfig {
    /// Required terraform version; any version is accepted when unset
    #[serde(default)]
    pub version: Option<String>,

    /// Explicit terraform binary, otherwise looked up on PATH
    #[serde(default)]
    pub path: Option<PathBuf>,

    /// Saved plan file for deploy runs
    #[serde(default = "default_plan_file")]
    pub plan_file: Option<String>,

    /// Saved plan file for destroy runs
    #[serde(default = "default_destroy_plan_file")]
    pub destroy_plan_file: Option<String>,

    /// -var-file arguments, relative to the working directory
    #[serde(default)]
    pub var_files: Vec<PathBuf>,

    /// -backend-config overrides passed to init
    #[serde(default)]
    pub backend_config: BTreeMap<String, String>,
}

fn default_plan_file() -> Option<String> {
    Some("tfplan".to_string())
}

fn default_destroy_plan_file() -> Option<String> {
    Some("tfdestroy".to_string())
}

impl Default for TerraformConfig {
    fn default() -> Self {
        Self {
            version: None,
            path: None,
            plan_file: default_plan_file(),
            destroy_plan_file: default_destroy_plan_file(),
            var_files: Vec::new(),
            backend_config: BTreeMap::new(),
        }
    }
}

/// AWS settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region exported to every step
    pub region: String,

    /// Role to assume through OIDC; static keys are used when unset
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Session name for the assumed role
    #[serde(default = "default_session_name")]
    pub session_name: String,
}

fn default_session_name() -> String {
    "tfflow".to_string()
}

/// Plan publishing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishConfig {
    /// Post the plan as a pull-request comment
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_config() {
        let yaml = r#"
name: "vpc"
aws:
  region: eu-west-1
"#;

        let config = DeployConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.name, "vpc");
        assert_eq!(config.working_directory, PathBuf::from("terraform"));
        assert_eq!(config.main_branch, "main");
        assert_eq!(config.terraform.plan_file.as_deref(), Some("tfplan"));
        assert_eq!(config.terraform.destroy_plan_file.as_deref(), Some("tfdestroy"));
        assert!(config.aws.role_arn.is_none());
        assert!(config.publish.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
version: "1"
name: "vpc"
working_directory: infra/vpc
main_branch: trunk
terraform:
  version: "1.6.6"
  plan_file: null
  var_files:
    - prod.tfvars
  backend_config:
    bucket: state-bucket
    dynamodb_table: locks
aws:
  region: us-east-1
  role_arn: arn:aws:iam::123456789012:role/deploy
publish:
  enabled: false
env:
  TF_VAR_environment: prod
"#;

        let config = DeployConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.working_directory, PathBuf::from("infra/vpc"));
        assert_eq!(config.main_branch, "trunk");
        assert!(config.terraform.plan_file.is_none());
        assert_eq!(config.terraform.backend_config["bucket"], "state-bucket");
        assert_eq!(
            config.aws.role_arn.as_deref(),
            Some("arn:aws:iam::123456789012:role/deploy")
        );
        assert!(!config.publish.enabled);
        assert_eq!(config.env["TF_VAR_environment"], "prod");
    }

    #[test]
    fn test_parse_toml_config() {
        let content = r#"
name = "vpc"
working_directory = "tf"

[aws]
region = "us-west-2"

[terraform.backend_config]
bucket = "b"
"#;

        let config = DeployConfig::from_toml(content).unwrap();
        assert_eq!(config.aws.region, "us-west-2");
        assert_eq!(config.terraform.backend_config["bucket"], "b");
    }

    #[test]
    fn test_missing_config_file() {
        let err = DeployConfig::from_file(Path::new("/nonexistent/.tfflow.yaml")).unwrap_err();
        assert!(matches!(err, TfflowError::ConfigNotFound { .. }));
    }

    #[test]
    fn test_starter_round_trips() {
        let config = DeployConfig::starter("vpc");
        let yaml = config.to_yaml().unwrap();
        let parsed = DeployConfig::from_yaml(&yaml).unwrap();
        assert_eq!(parsed.name, "vpc");
        assert_eq!(parsed.terraform.backend_config.len(), 4);
    }

    #[test]
    fn test_resolve_working_dir() {
        let config = DeployConfig::starter("vpc");
        assert_eq!(
            config.resolve_working_dir(Path::new("/repo")),
            PathBuf::from("/repo/terraform")
        );
    }
}

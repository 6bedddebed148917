// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Init command - write a starter configuration

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::DeployConfig;
use crate::errors::TfflowError;

/// Run the init command
pub async fn run(config_path: &Path, name: Option<String>, force: bool) -> Result<()> {
    let stack_name = name.unwrap_or_else(|| {
        std::env::current_dir()
            .ok()
            .and_then(|p| p.file_name().map(|s| s.to_string_lossy().to_string()))
            .unwrap_or_else(|| "stack".to_string())
    });

    if config_path.exists() && !force {
        return Err(miette::miette!(
            "{} already exists. Use --force to overwrite.",
            config_path.display()
        ));
    }

    let config = DeployConfig::starter(&stack_name);
    let content = format!(
        "# tfflow configuration for '{}'\n\
         # Static keys are read from AWS_ACCESS_KEY_ID / AWS_SECRET_ACCESS_KEY;\n\
         # set aws.role_arn to use OIDC instead.\n{}",
        stack_name,
        config.to_yaml()?
    );

    std::fs::write(config_path, content).map_err(|e| TfflowError::FileWriteError {
        path: config_path.to_path_buf(),
        error: e.to_string(),
    })?;

    println!("  {} Created {}", "✓".green(), config_path.display());
    println!();
    println!("Next steps:");
    println!("  1. Point working_directory at your Terraform root module");
    println!("  2. Fill in terraform.backend_config for your state bucket and lock table");
    println!("  3. Run {}", "tfflow check".cyan());

    Ok(())
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Check command - validate the configuration

use colored::Colorize;
use miette::Result;
use std::path::Path;

use crate::config::{ConfigValidator, DeployConfig};

/// Run the check command
pub async fn run(config_path: &Path, verbose: bool) -> Result<()> {
    println!("{}", "Checking configuration...".bold());
    println!();

    let config = match DeployConfig::from_file(config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("  {} Failed to load {}", "✗".red(), config_path.display());
            eprintln!();
            return Err(e.into());
        }
    };

    println!("  {} {} parsed", "✓".green(), config_path.display());

    let validation = ConfigValidator::validate(&config);

    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let missing_files = ConfigValidator::validate_files(&config, &cwd)?;

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !missing_files.is_empty() {
        println!();
        println!("{}:", "Missing files".yellow().bold());
        for missing in &missing_files {
            println!("  {} {}", "⚠".yellow(), missing);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Summary".bold());
        println!("  Stack: {}", config.name);
        println!("  Working directory: {}", config.working_directory.display());
        println!("  Region: {}", config.aws.region);
        println!(
            "  Auth: {}",
            config
                .aws
                .role_arn
                .as_deref()
                .map(|arn| format!("OIDC ({})", arn))
                .unwrap_or_else(|| "static keys".to_string())
        );
        println!(
            "  Terraform: {}",
            config.terraform.version.as_deref().unwrap_or("any version")
        );
    }

    println!();

    if !validation.is_valid() || !missing_files.is_empty() {
        return Err(miette::miette!("Configuration check failed"));
    }

    if validation.has_warnings() {
        println!("{}", "Configuration is valid but has warnings.".yellow().bold());
    } else {
        println!("{}", "Configuration is valid!".green().bold());
    }

    Ok(())
}

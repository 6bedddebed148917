// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! tfflow - Terraform deployment orchestrator
//!
//! Plan on pull requests, apply on main, destroy behind a typed confirmation.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tfflow::cli::{Cli, Commands};
use tfflow::pipeline::{PipelineKind, TriggerOverride};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "tfflow=debug" } else { "tfflow=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    match cli.command {
        Commands::Deploy { event, pr, dry_run } => {
            let overrides = TriggerOverride {
                event,
                pr_number: pr,
                confirmation: None,
            };
            tfflow::cli::run::run(
                PipelineKind::Deploy,
                &cli.config,
                overrides,
                dry_run,
                cli.verbose,
            )
            .await
        }
        Commands::Destroy {
            event,
            confirm,
            dry_run,
        } => {
            let overrides = TriggerOverride {
                event,
                pr_number: None,
                confirmation: confirm,
            };
            tfflow::cli::run::run(
                PipelineKind::Destroy,
                &cli.config,
                overrides,
                dry_run,
                cli.verbose,
            )
            .await
        }
        Commands::Steps { pipeline, event } => tfflow::cli::steps::run(pipeline, event).await,
        Commands::Check => tfflow::cli::check::run(&cli.config, cli.verbose).await,
        Commands::Init { name, force } => tfflow::cli::init::run(&cli.config, name, force).await,
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for tfflow.

pub mod check;
pub mod init;
pub mod run;
pub mod steps;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::DEFAULT_CONFIG_FILE;
use crate::pipeline::{EventKind, PipelineKind};

/// Terraform deployment orchestrator
///
/// Plans on pull requests, applies on pushes to main, destroys only on a
/// confirmed manual dispatch.
#[derive(Parser, Debug)]
#[clap(
    name = "tfflow",
    version,
    about = "Terraform deploy and destroy orchestrator",
    long_about = None,
    after_help = "Examples:\n\
        tfflow init --name vpc                  Write a starter .tfflow.yaml\n\
        tfflow deploy                           Plan or apply, depending on the CI event\n\
        tfflow deploy --event pull-request      Plan and print the comment locally\n\
        tfflow destroy --confirm destroy        Tear the stack down\n\n\
        See 'tfflow <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,

    /// Configuration file
    #[clap(short, long, global = true, default_value = DEFAULT_CONFIG_FILE, env = "TFFLOW_CONFIG")]
    pub config: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the deploy pipeline (plan, then publish or apply)
    Deploy {
        /// Triggering event (push, pull-request, dispatch); detected from CI when omitted
        #[clap(short, long)]
        event: Option<EventKind>,

        /// Pull request number for the plan comment
        #[clap(long)]
        pr: Option<u64>,

        /// Dry run (show the steps without running them)
        #[clap(long)]
        dry_run: bool,
    },

    /// Run the destroy pipeline (manual dispatch only)
    Destroy {
        /// Triggering event; detected from CI when omitted
        #[clap(short, long)]
        event: Option<EventKind>,

        /// Confirmation text; must be exactly 'destroy' (defaults to 'no')
        #[clap(long, env = "TFFLOW_CONFIRM")]
        confirm: Option<String>,

        /// Dry run (show the steps without running them)
        #[clap(long)]
        dry_run: bool,
    },

    /// Show the step order a pipeline would run
    Steps {
        /// Pipeline (deploy or destroy)
        pipeline: PipelineKind,

        /// Triggering event
        #[clap(short, long, default_value = "push")]
        event: EventKind,
    },

    /// Validate the configuration
    Check,

    /// Write a starter configuration
    Init {
        /// Stack name (defaults to the current directory name)
        #[clap(long)]
        name: Option<String>,

        /// Overwrite an existing configuration
        #[clap(long)]
        force: bool,
    },
}

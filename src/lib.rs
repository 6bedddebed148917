// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! # tfflow - Terraform Deployment Orchestrator
//!
//! `tfflow` runs the deploy and destroy pipelines for a Terraform stack from
//! CI, as a fixed sequence of steps that stops at the first failure.
//!
//! ## Pipelines
//!
//! - **deploy** - checkout, authenticate, install, fmt, init, validate, plan;
//!   then pull requests get the plan as a comment and everything else applies
//! - **destroy** - manual dispatch only, gated on typing `destroy` exactly
//!
//! ## Quick Start
//!
//! ```bash
//! # Write a starter configuration
//! tfflow init --name vpc
//!
//! # In CI: the event decides between plan-and-comment and apply
//! tfflow deploy
//!
//! # Locally: see what a pull request run would do
//! tfflow steps deploy --event pull-request
//!
//! # Tear down
//! tfflow destroy --event dispatch --confirm destroy
//! ```

pub mod cli;
pub mod config;
pub mod errors;
pub mod executors;
pub mod pipeline;
pub mod utils;

// Re-export commonly used types
pub use config::DeployConfig;
pub use errors::{TfflowError, TfflowResult};
pub use pipeline::{Pipeline, PipelineKind, StepKind, Trigger};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

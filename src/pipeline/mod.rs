// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Pipeline definitions and sequencing
//!
//! This module defines triggers, steps and the two pipelines, plus the
//! confirmation gate, the deploy branch selector and the step sequencer.

mod branch;
mod definition;
mod executor;
pub mod gate;
pub mod trigger;

pub use branch::{select_branch, Branch};
pub use definition::*;
pub use executor::{
    ExecutionOptions, PipelineExecutor, PipelineRun, RunStatus, StepOutcome, StepResult,
};
pub use gate::{DEFAULT_CONFIRMATION, DESTROY_SENTINEL};
pub use trigger::{EventKind, TriggerOverride};

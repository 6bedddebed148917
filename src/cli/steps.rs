// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Steps command - show the resolved step order

use miette::Result;

use crate::pipeline::{EventKind, Pipeline, PipelineKind, Trigger};

/// Run the steps command
pub async fn run(kind: PipelineKind, event: EventKind) -> Result<()> {
    let trigger = match event {
        EventKind::Push => Trigger::PushToMain,
        EventKind::PullRequest => Trigger::PullRequest { number: None },
        EventKind::Dispatch => Trigger::ManualDispatch { confirmation: None },
    };

    let pipeline = Pipeline::resolve(kind, &trigger);
    for (i, step) in pipeline.steps.iter().enumerate() {
        println!("{}. {}", i + 1, step);
    }

    Ok(())
}

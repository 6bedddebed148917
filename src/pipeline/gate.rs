// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Destroy confirmation gate

use crate::errors::TfflowError;
use crate::pipeline::Trigger;

/// The only confirmation that lets a destroy run proceed
pub const DESTROY_SENTINEL: &str = "destroy";

/// Value assumed when the dispatch carried no confirmation input
pub const DEFAULT_CONFIRMATION: &str = "no";

/// Check a confirmation string against the sentinel.
///
/// Exact, case-sensitive comparison. Whitespace is not trimmed.
pub fn check_confirmation(confirmation: &str) -> Result<(), TfflowError> {
    if confirmation == DESTROY_SENTINEL {
        Ok(())
    } else {
        Err(TfflowError::ConfirmationMismatch {
            expected: DESTROY_SENTINEL.to_string(),
            received: confirmation.to_string(),
        })
    }
}

/// Gate a trigger. Anything but a manual dispatch is rejected outright.
pub fn check_trigger(trigger: &Trigger) -> Result<(), TfflowError> {
    match trigger {
        Trigger::ManualDispatch { confirmation } => {
            check_confirmation(confirmation.as_deref().unwrap_or(DEFAULT_CONFIRMATION))
        }
        other => Err(TfflowError::UnsupportedTrigger {
            reason: format!("destroy cannot run on {}", other),
        }),
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Deploy branch selection

use crate::pipeline::Trigger;

/// What the deploy pipeline does once a plan exists
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// Post the plan for review and stop
    PublishPlan,
    /// Apply the plan
    Apply,
}

/// Pull requests only publish; every other trigger applies.
pub fn select_branch(trigger: &Trigger) -> Branch {
    if trigger.is_pull_request() {
        Branch::PublishPlan
    } else {
        Branch::Apply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_branch() {
        assert_eq!(
            select_branch(&Trigger::PullRequest { number: Some(1) }),
            Branch::PublishPlan
        );
        assert_eq!(
            select_branch(&Trigger::PullRequest { number: None }),
            Branch::PublishPlan
        );
        assert_eq!(select_branch(&Trigger::PushToMain), Branch::Apply);
        assert_eq!(
            select_branch(&Trigger::ManualDispatch {
                confirmation: Some("destroy".into())
            }),
            Branch::Apply
        );
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Captured plans
//!
//! Plan text kept between the plan step and the publish step, with a
//! parsed change summary and a content digest.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

/// Change counts from a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PlanSummary {
    pub import: u32,
    pub add: u32,
    pub change: u32,
    pub destroy: u32,
}

fn summary_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"Plan: (?:(\d+) to import, )?(\d+) to add, (\d+) to change, (\d+) to destroy\.",
        )
        .expect("plan summary regex is valid")
    })
}

impl PlanSummary {
    /// Parse the summary line of `terraform plan -no-color` output.
    ///
    /// Returns `Some(default)` for "No changes." and `None` when the text
    /// has neither form.
    pub fn parse(plan_text: &str) -> Option<Self> {
        if let Some(caps) = summary_regex().captures(plan_text) {
            let count = |i: usize| -> u32 {
                caps.get(i)
                    .and_then(|m| m.as_str().parse().ok())
                    .unwrap_or(0)
            };
            return Some(Self {
                import: count(1),
                add: count(2),
                change: count(3),
                destroy: count(4),
            });
        }

        if plan_text.contains("No changes.") {
            return Some(Self::default());
        }

        None
    }

    pub fn has_changes(&self) -> bool {
        self.import > 0 || self.add > 0 || self.change > 0 || self.destroy > 0
    }
}

impl std::fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if !self.has_changes() {
            return write!(f, "no changes");
        }
        if self.import > 0 {
            write!(f, "{} to import, ", self.import)?;
        }
        write!(
            f,
            "{} to add, {} to change, {} to destroy",
            self.add, self.change, self.destroy
        )
    }
}

/// A plan produced by this run
#[derive(Debug, Clone)]
pub struct CapturedPlan {
    /// Human-readable plan output
    pub text: String,
    /// Parsed change counts, if the output had a summary
    pub summary: Option<PlanSummary>,
    /// blake3 digest of the saved plan file, or of the text when none was saved
    pub digest: String,
}

impl CapturedPlan {
    /// Capture plan output, fingerprinting the saved plan file when present
    pub fn capture(text: String, plan_file: Option<&Path>) -> Self {
        let digest = match plan_file.and_then(|p| std::fs::read(p).ok()) {
            Some(bytes) => blake3::hash(&bytes).to_hex().to_string(),
            None => blake3::hash(text.as_bytes()).to_hex().to_string(),
        };

        Self {
            summary: PlanSummary::parse(&text),
            text,
            digest,
        }
    }

    /// First 12 hex characters of the digest
    pub fn short_digest(&self) -> &str {
        &self.digest[..self.digest.len().min(12)]
    }
}

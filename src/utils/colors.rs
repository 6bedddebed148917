// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Terminal output for step results

use colored::{ColoredString, Colorize};

use crate::pipeline::{StepKind, StepOutcome, StepResult};

/// Marker for a step outcome
pub fn outcome_marker(outcome: &StepOutcome) -> ColoredString {
    match outcome {
        StepOutcome::Passed => "✓".green(),
        StepOutcome::Failed(_) => "✗".red(),
    }
}

/// Whether a passed step's output is printed under its result line.
///
/// The destroy banner always is; other output only when verbose.
pub fn shows_output(result: &StepResult, verbose: bool) -> bool {
    !result.stdout.trim().is_empty() && (verbose || result.step == StepKind::ReportSuccess)
}

/// Print the one-line result of a step, plus its output when verbose
pub fn print_step_line(result: &StepResult, verbose: bool) {
    let marker = outcome_marker(&result.outcome);
    let name = result.step.to_string();

    match &result.outcome {
        StepOutcome::Passed => {
            println!(
                "  {} {} ({:.2}s)",
                marker,
                name.bold(),
                result.duration.as_secs_f64()
            );
            if shows_output(result, verbose) {
                println!("{}", indent(result.stdout.trim_end()).dimmed());
            }
        }
        StepOutcome::Failed(reason) => {
            println!("  {} {} failed", marker, name.bold());
            eprintln!("{}", indent(reason).dimmed());
        }
    }
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("      {}", line))
        .collect::<Vec<_>>()
        .join("\n")
}

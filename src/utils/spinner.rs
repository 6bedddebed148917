// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 tfflow contributors

//! Progress spinner utilities

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a spinner for a running step
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner()
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏")
        .template("  {spinner:.blue} {msg} {elapsed:.dim}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Spinners only make sense on an interactive terminal; CI logs get plain lines.
pub fn progress_enabled(verbose: bool) -> bool {
    !verbose && console::Term::stdout().is_term() && std::env::var_os("CI").is_none()
}

//! Console output helpers for consistent CLI formatting.

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print a success message with green checkmark.
pub fn success(msg: impl std::fmt::Display) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info/action message with blue arrow.
pub fn info(msg: impl std::fmt::Display) {
    println!("{} {}", style("→").blue().bold(), msg);
}

/// Print a warning message with yellow exclamation.
pub fn warn(msg: impl std::fmt::Display) {
    println!("{} {}", style("!").yellow().bold(), msg);
}

/// Print a dim hint message.
pub fn hint(msg: impl std::fmt::Display) {
    println!("{} {}", style("→").dim(), msg);
}

/// Style text as a package/target name (cyan).
pub fn pkg(name: impl std::fmt::Display) -> StyledObject<String> {
    style(name.to_string()).cyan()
}

/// Style text as a version or count (cyan).
pub fn num<T: std::fmt::Display>(n: T) -> StyledObject<String> {
    style(n.to_string()).cyan()
}

/// Style text as dimmed/secondary.
pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

/// A ticking spinner for work of unknown length.
pub fn spinner(msg: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Stop a spinner, leaving a checkmark line behind.
pub fn finish(pb: &ProgressBar, msg: impl std::fmt::Display) {
    pb.finish_with_message(format!("{} {}", style("✓").green(), msg));
}

/// `N package(s)`, pluralized.
pub fn packages(count: usize) -> String {
    if count == 1 {
        "1 package".to_string()
    } else {
        format!("{} packages", count)
    }
}

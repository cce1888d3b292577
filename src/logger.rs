//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `LineCounter` for in-place progress counts during long parses
//!
//! # Example
//!
//! ```ignore
//! log!("extract"; "parsed {} posts", count);
//!
//! let counter = LineCounter::new("extract", "posts");
//! counter.tick(500);   // "[extract] 500 posts..."
//! counter.finish();    // move to the next line
//! ```

use colored::{ColoredString, Colorize};
use std::io::{Write, stdout};

/// Log a message with a colored module prefix.
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a message with a colored module prefix.
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut stdout = stdout().lock();
    writeln!(stdout, "{prefix} {message}").ok();
    stdout.flush().ok();
}

/// Apply color to a module prefix based on module type.
fn colorize_prefix(module: &str) -> ColoredString {
    let prefix = format!("[{module}]");
    match module.to_ascii_lowercase().as_str() {
        "error" => prefix.bright_red().bold(),
        "sitemap" | "authors" => prefix.bright_green().bold(),
        _ => prefix.bright_yellow().bold(),
    }
}

/// Single-line in-place counter for long-running loops.
///
/// Each `tick` rewrites the same terminal line with `\r`, so a 142k-item
/// parse does not scroll the screen. Call `finish` before normal logging
/// resumes.
pub struct LineCounter {
    prefix: ColoredString,
    unit: &'static str,
}

impl LineCounter {
    pub fn new(module: &str, unit: &'static str) -> Self {
        Self {
            prefix: colorize_prefix(module),
            unit,
        }
    }

    /// Overwrite the current line with the running count.
    pub fn tick(&self, count: usize) {
        let mut stdout = stdout().lock();
        write!(stdout, "\r{} {} {}...", self.prefix, count, self.unit).ok();
        stdout.flush().ok();
    }

    /// Terminate the counter line so subsequent logs start fresh.
    pub fn finish(&self) {
        let mut stdout = stdout().lock();
        writeln!(stdout).ok();
        stdout.flush().ok();
    }
}

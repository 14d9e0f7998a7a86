//! Output formatting and the CI boundary
//!
//! Besides the styled console helpers, this module is where secret
//! values cross into the hosting CI's masking mechanism: every decoded
//! secret and generated password goes through [`mask_secret`] before
//! any further processing.

use std::io::Write;

use console::style;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", style("✓").green().bold(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", style("→").blue(), message);
}

/// Create a styled key-value line
pub fn key_value(key: &str, value: &str) -> String {
    format!("  {}: {}", style(key).dim(), value)
}

/// Register a value with the CI runner's log masker.
///
/// Emits the `add-mask` workflow command; the runner redacts the value
/// from all subsequent log output. A no-op for empty values.
pub fn mask_secret(value: &str) {
    if value.is_empty() {
        return;
    }
    println!("::add-mask::{value}");
}

/// Publish a named output for downstream workflow steps.
///
/// Writes to the `GITHUB_OUTPUT` file when the runner provides one,
/// falling back to the legacy `set-output` workflow command.
pub fn set_output(name: &str, value: &str) {
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
        let appended = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .and_then(|mut file| writeln!(file, "{name}={value}"));
        if appended.is_ok() {
            return;
        }
    }
    println!("::set-output name={name}::{value}");
}

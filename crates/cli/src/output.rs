//! CLI output formatting utilities.
//!
//! Provides consistent formatting for terminal output: colored status
//! messages, aligned tables and JSON.

use anyhow::Context;
use clap::ValueEnum;
use owo_colors::{OwoColorize, Stream};

#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
  #[default]
  Text,
  Json,
}

impl OutputFormat {
  pub fn is_json(self) -> bool {
    matches!(self, OutputFormat::Json)
  }
}

pub mod symbols {
  pub const SUCCESS: &str = "✓";
  pub const ERROR: &str = "✗";
  pub const INFO: &str = "•";
  pub const MINUS: &str = "-";
}

/// `1 file`, `2 files`.
pub fn format_count(count: usize, noun: &str) -> String {
  if count == 1 {
    format!("{} {}", count, noun)
  } else {
    format!("{} {}s", count, noun)
  }
}

/// Two-column row with the first column padded to `width`.
pub fn format_row(left: &str, right: &str, width: usize) -> String {
  format!("{:width$} {}", left, right, width = width)
}

pub fn print_success(message: &str) {
  println!(
    "{} {}",
    symbols::SUCCESS.if_supports_color(Stream::Stdout, |s| s.green()),
    message
  );
}

pub fn print_error(message: &str) {
  eprintln!(
    "{} {}",
    symbols::ERROR.if_supports_color(Stream::Stderr, |s| s.red()),
    message.if_supports_color(Stream::Stderr, |s| s.red())
  );
}

pub fn print_info(message: &str) {
  println!(
    "{} {}",
    symbols::INFO.if_supports_color(Stream::Stdout, |s| s.blue()),
    message
  );
}

pub fn print_stat(label: &str, value: &str) {
  println!(
    "  {}: {}",
    label.if_supports_color(Stream::Stdout, |s| s.dimmed()),
    value
  );
}

pub fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(value).context("Failed to serialize to JSON")?;
  println!("{}", json);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_format_count() {
    assert_eq!(format_count(0, "file"), "0 files");
    assert_eq!(format_count(1, "file"), "1 file");
    assert_eq!(format_count(12, "module"), "12 modules");
  }

  #[test]
  fn test_format_row() {
    assert_eq!(format_row("Button", "QtQuick.Controls/Button 1.0", 10), "Button     QtQuick.Controls/Button 1.0");
    assert_eq!(format_row("averyveryverylongname", "x", 4), "averyveryverylongname x");
  }

  #[test]
  fn test_output_format() {
    assert!(OutputFormat::Json.is_json());
    assert!(!OutputFormat::default().is_json());
  }
}

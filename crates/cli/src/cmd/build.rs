//! Implementation of the `qmlbridge build` command.
//!
//! Builds every given source file or directory into the build directory (the
//! last path argument) and prints each file that had to be rebuilt. When the
//! build aborts, the files rebuilt before the failure are still listed.

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::debug;

use qmlbridge_lib::build::BuiltFile;
use qmlbridge_lib::manifest::ModuleRegistry;
use qmlbridge_lib::{BuildOptions, Session};

use crate::output::{OutputFormat, format_count, format_row, print_info, print_json, print_success, symbols};

/// Width of the first column of the module table.
const MODULE_COLUMN_WIDTH: usize = 25;

/// Width of the rule under the module table header.
const MODULE_RULE_WIDTH: usize = 70;

/// Options of the build command.
#[derive(Debug)]
pub struct BuildArgs {
  /// Sources followed by the build directory.
  pub paths: Vec<PathBuf>,
  pub no_polyfills: bool,
  pub no_babel: bool,
  pub show_modules: bool,
  pub output: OutputFormat,
}

#[derive(Serialize)]
struct BuildSummary<'a> {
  build_dir: String,
  built: &'a [BuiltFile],
  up_to_date: &'a [String],
  build_order: Vec<String>,
}

/// Execute the build command.
///
/// The QML module registry is scanned once, before anything is resolved.
/// With `--modules` the registry is listed and nothing is built.
pub fn cmd_build(args: BuildArgs) -> Result<()> {
  let registry = ModuleRegistry::discover().context("Failed to load QML module manifests")?;

  if args.show_modules {
    return print_modules(&registry, args.output);
  }

  let (build_dir, sources) = args
    .paths
    .split_last()
    .context("Expected at least one source and a build directory")?;
  let work_dir = std::env::current_dir().context("Failed to determine working directory")?;

  let options = BuildOptions::new(work_dir, build_dir)
    .with_polyfills(!args.no_polyfills)
    .with_lowering(!args.no_babel);
  debug!(build_dir = %options.build_dir.display(), sources = sources.len(), "starting build");

  let build_dir = options.build_dir.display().to_string();
  let mut session = Session::new(options, registry).context("Failed to start build session")?;
  for source in sources {
    if let Err(err) = session.build(source) {
      if !args.output.is_json() {
        print_built(&session.report().built);
      }
      return Err(anyhow::Error::new(err).context(format!("Failed to build {}", source.display())));
    }
  }

  let build_order = session.graph().build_order().unwrap_or_default();
  let report = session.finish();

  if args.output.is_json() {
    return print_json(&BuildSummary {
      build_dir,
      built: &report.built,
      up_to_date: &report.up_to_date,
      build_order,
    });
  }

  print_built(&report.built);

  if report.is_noop() {
    print_info(&format!("Everything up to date in {}", build_dir));
  } else {
    print_success(&format!(
      "Built {} ({} up to date)",
      format_count(report.built.len(), "file"),
      report.up_to_date.len()
    ));
  }

  Ok(())
}

/// One ` - <file>` line per file rebuilt, in build order.
fn print_built(built: &[BuiltFile]) {
  for file in built {
    println!(" {} {}", symbols::MINUS, file.file);
  }
}

/// List registered modules, sorted by name.
fn print_modules(registry: &ModuleRegistry, output: OutputFormat) -> Result<()> {
  if output.is_json() {
    let modules: serde_json::Map<String, serde_json::Value> = registry
      .iter()
      .map(|(name, target)| (name.to_string(), serde_json::Value::from(target)))
      .collect();
    return print_json(&modules);
  }

  println!("{}", format_row("ES6 Module Alias", "Actual QML import", MODULE_COLUMN_WIDTH));
  println!("{}", "-".repeat(MODULE_RULE_WIDTH));
  for (name, target) in registry.iter() {
    println!("{}", format_row(name, target, MODULE_COLUMN_WIDTH));
  }

  Ok(())
}

//! Info command implementation.
//!
//! Shows where the build looks for its inputs and collaborators.

use anyhow::{Context, Result};

use qmlbridge_lib::BuildOptions;
use qmlbridge_lib::config::{lowering_command, qml_install_root};
use qmlbridge_lib::manifest::ModuleRegistry;

use crate::output::{OutputFormat, print_json, print_stat, print_success};

pub fn cmd_info(output: OutputFormat) -> Result<()> {
  let work_dir = std::env::current_dir().context("Failed to determine working directory")?;
  let options = BuildOptions::new(&work_dir, ".");
  let qml_root = qml_install_root();

  let modules = match &qml_root {
    Some(root) if root.is_dir() => ModuleRegistry::scan(root).context("Failed to load QML module manifests")?,
    _ => ModuleRegistry::new(),
  };
  let qml_root = qml_root.map(|p| p.display().to_string());

  if output.is_json() {
    return print_json(&serde_json::json!({
      "version": env!("CARGO_PKG_VERSION"),
      "work_dir": work_dir.display().to_string(),
      "cache": options.cache_path().display().to_string(),
      "packages": options.packages_dir().display().to_string(),
      "lowering_command": lowering_command(),
      "qml_root": qml_root,
      "modules": modules.len(),
    }));
  }

  print_success(&format!("qmlbridge v{}", env!("CARGO_PKG_VERSION")));
  println!();
  print_stat("Working dir", &work_dir.display().to_string());
  print_stat("Cache", &options.cache_path().display().to_string());
  print_stat("Packages", &options.packages_dir().display().to_string());
  print_stat("Lowering", &lowering_command());
  print_stat("QML root", qml_root.as_deref().unwrap_or("(not found)"));
  print_stat("QML modules", &modules.len().to_string());

  Ok(())
}

//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Isolated project directory.
///
/// Each test gets its own working directory with its own cache, `node_modules`
/// and QML installation root.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Project root (the command's working directory).
  pub fn root(&self) -> &Path {
    self.temp.path()
  }

  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root().join(relative_path)
  }

  /// Write a file relative to the project root.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Read a file relative to the project root.
  pub fn read_file(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// QML installation root scanned for module manifests.
  pub fn qml_root(&self) -> PathBuf {
    self.path("qml")
  }

  /// Get a pre-configured Command for the qmlbridge binary.
  ///
  /// Runs in the project root with:
  /// - `QMLBRIDGE_QML_ROOT`: the isolated QML installation root
  /// - `RUST_LOG` removed, so only warnings are logged
  pub fn qmlbridge_cmd(&self) -> Command {
    let mut cmd: Command = cargo_bin_cmd!("qmlbridge");
    cmd.current_dir(self.root());
    cmd.env("QMLBRIDGE_QML_ROOT", self.qml_root());
    cmd.env_remove("RUST_LOG");
    cmd
  }

  /// `qmlbridge build <sources...> build --no-babel --no-polyfills`.
  pub fn build_cmd(&self, sources: &[&str]) -> Command {
    let mut cmd = self.qmlbridge_cmd();
    cmd.arg("build").args(sources).arg("build").args(["--no-babel", "--no-polyfills"]);
    cmd
  }
}

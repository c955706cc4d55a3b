//! Test utilities for qmlbridge-lib.
//!
//! Provides an on-disk project fixture: a temporary working directory that
//! tests populate with sources, packages and manifests.

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use crate::config::BuildOptions;

/// Temporary project directory.
pub struct Fixture {
  _temp: TempDir,
  root: PathBuf,
}

impl Fixture {
  pub fn new() -> Self {
    let temp = TempDir::new().unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();
    Self { _temp: temp, root }
  }

  /// The working directory of the fixture project.
  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Absolute path of a file relative to the project root.
  pub fn path(&self, relative_path: &str) -> PathBuf {
    self.root.join(relative_path)
  }

  /// Write a file relative to the project root, creating parent directories.
  pub fn write(&self, relative_path: &str, content: &str) -> PathBuf {
    let path = self.path(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  /// Read a file relative to the project root.
  pub fn read(&self, relative_path: &str) -> String {
    std::fs::read_to_string(self.path(relative_path))
      .unwrap_or_else(|e| panic!("Failed to read {}: {}", relative_path, e))
  }

  /// Build options writing to `<root>/build`, without lowering or polyfills and
  /// without an engine timestamp.
  pub fn options(&self) -> BuildOptions {
    BuildOptions::new(&self.root, "build")
      .with_lowering(false)
      .with_polyfills(false)
      .with_engine_stamp(None)
  }
}

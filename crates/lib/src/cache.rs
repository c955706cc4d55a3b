//! Persisted build cache.
//!
//! After every rewritten file the whole cache is written to `.qmlbridge_cache`
//! in the working directory, so a later run can skip unchanged files and still
//! know their dependencies and implicit globals.
//!
//! # Cache Format
//!
//! ```yaml
//! files:
//!   src/app.js:
//!     dependencies:
//!     - util.js
//!     - ../node_modules/lodash/index.js
//!     globals:
//!     - appState
//!     modules:
//!     - Button
//! ```
//!
//! Dependency paths are relative to the directory of the file that owns the
//! entry, so the cache survives moving the checkout.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::util::path::{normalize, relative, to_slash};

/// Cached summary of one built source file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
  /// File dependencies, relative to the owning file's directory.
  #[serde(default)]
  pub dependencies: Vec<String>,

  /// Implicit global names the file exposes.
  #[serde(default)]
  pub globals: Vec<String>,

  /// Registered QML module names the file imports.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub modules: Vec<String>,
}

impl CacheEntry {
  /// Build an entry for a file living in `dir`.
  pub fn new<'a>(
    dir: &Path,
    dependencies: &[PathBuf],
    globals: impl IntoIterator<Item = &'a String>,
    modules: &[String],
  ) -> Self {
    Self {
      dependencies: dependencies.iter().map(|dep| to_slash(&relative(dep, dir))).collect(),
      globals: globals.into_iter().cloned().collect(),
      modules: modules.to_vec(),
    }
  }

  /// Dependencies as absolute paths, given the owning file's directory.
  pub fn resolve_dependencies(&self, dir: &Path) -> Vec<PathBuf> {
    self
      .dependencies
      .iter()
      .map(|dep| normalize(&dir.join(dep)))
      .collect()
  }
}

/// Errors that can occur when writing the cache.
#[derive(Debug, Error)]
pub enum CacheError {
  /// Failed to write the cache file.
  #[error("failed to write cache file: {0}")]
  Write(#[source] io::Error),

  /// Failed to serialize the cache.
  #[error("failed to serialize cache: {0}")]
  Serialize(#[source] serde_yaml::Error),
}

/// Project-wide cache keyed by input path.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BuildCache {
  #[serde(default)]
  pub files: BTreeMap<String, CacheEntry>,
}

impl BuildCache {
  /// Create an empty cache.
  pub fn new() -> Self {
    Self::default()
  }

  /// Load the cache from `path`.
  ///
  /// A missing, unreadable or corrupt cache is not an error: it yields an empty
  /// cache, which makes every file look like a first build.
  pub fn load(path: &Path) -> Self {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no build cache, starting fresh");
        return Self::new();
      }
      Err(e) => {
        warn!(path = %path.display(), error = %e, "cannot read build cache, starting fresh");
        return Self::new();
      }
    };

    match serde_yaml::from_str::<Option<BuildCache>>(&content) {
      Ok(cache) => cache.unwrap_or_default(),
      Err(e) => {
        warn!(path = %path.display(), error = %e, "corrupt build cache, starting fresh");
        Self::new()
      }
    }
  }

  /// Write the whole cache to `path`.
  ///
  /// Writes to a temporary sibling first and renames it into place.
  pub fn save(&self, path: &Path) -> Result<(), CacheError> {
    let content = serde_yaml::to_string(self).map_err(CacheError::Serialize)?;

    let mut temp_name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    fs::write(&temp_path, content).map_err(CacheError::Write)?;
    fs::rename(&temp_path, path).map_err(CacheError::Write)?;
    Ok(())
  }

  /// Get the entry for an input path key.
  pub fn get(&self, key: &str) -> Option<&CacheEntry> {
    self.files.get(key)
  }

  /// Insert or replace the entry for an input path key.
  pub fn upsert(&mut self, key: String, entry: CacheEntry) {
    self.files.insert(key, entry);
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }
}

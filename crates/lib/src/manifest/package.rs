//! External package metadata (`package.json`).

use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use super::ManifestError;
use crate::consts::{DEFAULT_PACKAGE_MAIN, PACKAGE_METADATA_FILENAME};

/// The parts of `package.json` the build cares about.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PackageMetadata {
  #[serde(default)]
  pub name: Option<String>,

  /// Entry point, relative to the package directory.
  #[serde(default)]
  pub main: Option<String>,
}

impl PackageMetadata {
  /// Load the metadata of the package rooted at `dir`.
  ///
  /// A package without `package.json` gets default metadata.
  pub fn load(dir: &Path) -> Result<Self, ManifestError> {
    let path = dir.join(PACKAGE_METADATA_FILENAME);
    let content = match fs::read_to_string(&path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => return Err(ManifestError::Read { path, source }),
    };

    serde_json::from_str(&content).map_err(|source| ManifestError::ParseJson { path, source })
  }

  /// Entry point relative to the package directory, `index.js` by default.
  pub fn entry_point(&self) -> &str {
    self
      .main
      .as_deref()
      .map(|main| main.strip_prefix("./").unwrap_or(main))
      .filter(|main| !main.is_empty())
      .unwrap_or(DEFAULT_PACKAGE_MAIN)
  }
}

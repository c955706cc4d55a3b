//! Project manifest (`package.yml` in the working directory).
//!
//! Only the `dependencies` map is consulted: it pins the version used when a
//! registered QML module is imported.
//!
//! ```yaml
//! dependencies:
//!   Button: 1.0
//!   QtQuick: "2.4"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::Deserialize;

use super::{ManifestError, scalar_to_string};

#[derive(Debug, Default, Deserialize)]
struct RawProjectManifest {
  #[serde(default)]
  dependencies: BTreeMap<String, serde_yaml::Value>,
}

/// Declared version constraints, keyed by import name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectManifest {
  pub dependencies: BTreeMap<String, String>,
}

impl ProjectManifest {
  /// Load the manifest from `path`.
  ///
  /// A missing file yields an empty manifest.
  pub fn load(path: &Path) -> Result<Self, ManifestError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
      Err(source) => {
        return Err(ManifestError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    let raw: Option<RawProjectManifest> = serde_yaml::from_str(&content).map_err(|source| ManifestError::ParseYaml {
      path: path.to_path_buf(),
      source,
    })?;

    let dependencies = raw
      .unwrap_or_default()
      .dependencies
      .iter()
      .filter_map(|(name, version)| scalar_to_string(version).map(|v| (name.clone(), v)))
      .collect();

    Ok(Self { dependencies })
  }

  /// Version declared for an import name.
  pub fn version_of(&self, name: &str) -> Option<&str> {
    self.dependencies.get(name).map(String::as_str)
  }
}

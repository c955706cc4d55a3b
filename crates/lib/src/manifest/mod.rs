//! Manifest and metadata files read by the build.
//!
//! - [`project`] - the optional `package.yml` in the working directory
//! - [`registry`] - QML module manifests mapping ES6 names to QML imports
//! - [`package`] - `package.json` metadata of external packages

pub mod package;
pub mod project;
pub mod registry;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use package::PackageMetadata;
pub use project::ProjectManifest;
pub use registry::{ModuleRegistry, ModuleTarget};

/// Errors that can occur when reading manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
  /// Failed to read a manifest file.
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// Failed to parse a YAML manifest.
  #[error("failed to parse {path}: {source}")]
  ParseYaml {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  /// Failed to parse a JSON metadata file.
  #[error("failed to parse {path}: {source}")]
  ParseJson {
    path: PathBuf,
    #[source]
    source: serde_json::Error,
  },

  /// A registered module target is not of the form `Module/Type [version]`.
  #[error("invalid QML import '{target}' for module '{name}': expected 'Module/Type [version]'")]
  InvalidModuleTarget { name: String, target: String },
}

/// Render a YAML scalar as a string. Versions such as `2.0` parse as numbers.
pub(crate) fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
  match value {
    serde_yaml::Value::String(s) => Some(s.clone()),
    serde_yaml::Value::Number(n) => Some(n.to_string()),
    serde_yaml::Value::Bool(b) => Some(b.to_string()),
    _ => None,
  }
}

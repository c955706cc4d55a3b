//! Build errors.
//!
//! Every variant is fatal: the session aborts on the first error and nothing
//! is retried.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::cache::CacheError;
use crate::graph::DependencyCycle;
use crate::manifest::ManifestError;

/// Errors that abort a build session.
#[derive(Debug, Error)]
pub enum BuildError {
  /// A newly registered dependency edge closed a cycle.
  #[error(transparent)]
  DependencyCycle(#[from] DependencyCycle),

  /// A specifier matched none of the resolution strategies.
  #[error("cannot resolve '{specifier}' required from {importer}: {message}")]
  UnresolvedImport {
    specifier: String,
    importer: String,
    message: String,
  },

  /// A specifier or require form that is never accepted.
  #[error("invalid import of '{specifier}': {message}")]
  InvalidImportForm { specifier: String, message: String },

  /// The external lowering compiler failed.
  #[error("lowering {path} failed: {message}")]
  LoweringFailure { path: PathBuf, message: String },

  /// Filesystem error while reading sources or writing outputs.
  #[error("io error on {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// The build cache could not be written.
  #[error("cache error: {0}")]
  Cache(#[from] CacheError),

  /// A manifest or package metadata file is malformed.
  #[error("manifest error: {0}")]
  Manifest(#[from] ManifestError),
}

impl BuildError {
  /// Wrap an I/O error with the path it occurred on.
  pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
    BuildError::Io {
      path: path.into(),
      source,
    }
  }

  /// Returns the cycle chain if this is a dependency cycle.
  pub fn cycle_chain(&self) -> Option<&[String]> {
    match self {
      BuildError::DependencyCycle(cycle) => Some(&cycle.chain),
      _ => None,
    }
  }
}

//! External packages installed under `node_modules`.
//!
//! Packages are located lazily, the first time a specifier names them, and
//! stay in the registry for the rest of the session.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::consts::SCRIPT_EXTENSION;
use crate::manifest::{ManifestError, PackageMetadata};
use crate::util::path::normalize;

/// One installed external package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPackage {
  /// Declared (directory) name, e.g. `lodash` or `@scope/pkg`.
  pub name: String,
  /// Source directory under `node_modules`.
  pub src_dir: PathBuf,
  /// Output directory under `<build>/dependencies`.
  pub out_dir: PathBuf,
  /// Entry point relative to `src_dir`.
  pub main: String,
}

impl ExternalPackage {
  /// Absolute path of the package's entry file.
  pub fn entry_file(&self) -> PathBuf {
    normalize(&self.src_dir.join(&self.main))
  }

  /// Absolute path of `<subpath>.js` inside the package.
  pub fn file(&self, subpath: &str) -> PathBuf {
    normalize(&self.src_dir.join(format!("{}.{}", subpath, SCRIPT_EXTENSION)))
  }
}

/// Session-wide registry of located packages.
#[derive(Debug)]
pub struct PackageRegistry {
  root: PathBuf,
  out_root: PathBuf,
  packages: HashMap<String, ExternalPackage>,
}

impl PackageRegistry {
  /// Create a registry for packages under `root`, built into `out_root`.
  pub fn new(root: impl Into<PathBuf>, out_root: impl Into<PathBuf>) -> Self {
    Self {
      root: root.into(),
      out_root: out_root.into(),
      packages: HashMap::new(),
    }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Find a package by name.
  ///
  /// Returns `Ok(None)` when no such directory exists under the root.
  pub fn lookup(&mut self, name: &str) -> Result<Option<&ExternalPackage>, ManifestError> {
    if !self.packages.contains_key(name) {
      let src_dir = self.root.join(name);
      if !src_dir.is_dir() {
        return Ok(None);
      }

      let metadata = PackageMetadata::load(&src_dir)?;
      let package = ExternalPackage {
        name: name.to_string(),
        out_dir: self.out_root.join(name),
        main: metadata.entry_point().to_string(),
        src_dir,
      };
      debug!(package = %name, main = %package.main, "located external package");
      self.packages.insert(name.to_string(), package);
    }

    Ok(self.packages.get(name))
  }

  /// Number of packages located so far.
  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }
}

/// Split a bare specifier into package name and optional sub-path.
///
/// Scoped names (`@scope/pkg`) keep their first two segments.
pub fn split_package_specifier(specifier: &str) -> (&str, Option<&str>) {
  let mut split_at = specifier.find('/');
  if specifier.starts_with('@') {
    split_at = split_at.and_then(|first| specifier[first + 1..].find('/').map(|i| first + 1 + i));
  }

  match split_at {
    Some(i) if i + 1 < specifier.len() => (&specifier[..i], Some(&specifier[i + 1..])),
    Some(i) => (&specifier[..i], None),
    None => (specifier, None),
  }
}

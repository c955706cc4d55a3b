//! Registry of declaratively exported QML modules.
//!
//! Installed QML modules may ship a `package.yml` whose `exports` map gives
//! ES6 module names to the QML type they stand for:
//!
//! ```yaml
//! exports:
//!   Button: QtQuick.Controls/Button 1.0
//!   Item: QtQuick/Item
//! ```
//!
//! The registry is scanned once per process, before any file is resolved, and
//! is read-only afterwards.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{ManifestError, scalar_to_string};
use crate::config::qml_install_root;
use crate::consts::MODULE_MANIFEST_FILENAME;

#[derive(Debug, Default, Deserialize)]
struct RawModuleManifest {
  #[serde(default)]
  exports: BTreeMap<String, serde_yaml::Value>,
}

/// A registered module's QML import, split into its parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleTarget {
  /// QML module to import, e.g. `QtQuick.Controls`.
  pub module: String,
  /// Type exposed by that module, e.g. `Button`.
  pub type_name: String,
  /// Version given in the registry entry, if any.
  pub version: Option<String>,
}

impl ModuleTarget {
  /// Parse a registry target.
  ///
  /// Accepts `Module/Type [version]` and the space separated
  /// `Module Type [version]`.
  pub fn parse(name: &str, target: &str) -> Result<Self, ManifestError> {
    let invalid = || ManifestError::InvalidModuleTarget {
      name: name.to_string(),
      target: target.to_string(),
    };

    let tokens: Vec<&str> = target.split_whitespace().collect();
    let (module, type_name, version) = match tokens.as_slice() {
      [path] | [path, _] if path.contains('/') => {
        let (module, type_name) = path.rsplit_once('/').ok_or_else(invalid)?;
        (module, type_name, tokens.get(1).copied())
      }
      [module, type_name] => (*module, *type_name, None),
      [module, type_name, version] if !module.contains('/') => (*module, *type_name, Some(*version)),
      _ => return Err(invalid()),
    };

    if module.is_empty() || type_name.is_empty() {
      return Err(invalid());
    }

    Ok(Self {
      module: module.to_string(),
      type_name: type_name.to_string(),
      version: version.map(str::to_string),
    })
  }
}

/// ES6 module name to QML import target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleRegistry {
  entries: BTreeMap<String, String>,
}

impl ModuleRegistry {
  /// Create an empty registry.
  pub fn new() -> Self {
    Self::default()
  }

  /// Create a registry from explicit entries.
  pub fn from_entries<I, K, V>(entries: I) -> Self
  where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
  {
    Self {
      entries: entries.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
    }
  }

  /// Scan the QML installation root (see [`qml_install_root`]).
  ///
  /// Without an installation root the registry is empty.
  pub fn discover() -> Result<Self, ManifestError> {
    match qml_install_root() {
      Some(root) if root.is_dir() => Self::scan(&root),
      Some(root) => {
        warn!(root = %root.display(), "QML installation root does not exist, no modules registered");
        Ok(Self::new())
      }
      None => Ok(Self::new()),
    }
  }

  /// Scan `root` recursively for module manifests.
  pub fn scan(root: &Path) -> Result<Self, ManifestError> {
    let mut registry = Self::new();

    let manifests = WalkDir::new(root)
      .follow_links(true)
      .sort_by_file_name()
      .into_iter()
      .filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
          warn!(error = %e, "skipping unreadable entry under QML root");
          None
        }
      })
      .filter(|entry| entry.file_type().is_file() && entry.file_name() == MODULE_MANIFEST_FILENAME);

    for entry in manifests {
      registry.load_manifest(entry.path())?;
    }

    debug!(root = %root.display(), modules = registry.len(), "scanned QML module manifests");
    Ok(registry)
  }

  fn load_manifest(&mut self, path: &Path) -> Result<(), ManifestError> {
    let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let raw: Option<RawModuleManifest> = serde_yaml::from_str(&content).map_err(|source| ManifestError::ParseYaml {
      path: path.to_path_buf(),
      source,
    })?;

    for (name, target) in raw.unwrap_or_default().exports {
      let Some(target) = scalar_to_string(&target) else {
        warn!(manifest = %path.display(), name = %name, "ignoring non-scalar export");
        continue;
      };
      if let Some(previous) = self.entries.insert(name.clone(), target.clone()) {
        warn!(name = %name, previous = %previous, target = %target, "module exported more than once, last one wins");
      }
    }

    Ok(())
  }

  /// Raw target string for a module name.
  pub fn get(&self, name: &str) -> Option<&str> {
    self.entries.get(name).map(String::as_str)
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.contains_key(name)
  }

  /// Entries sorted by module name.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

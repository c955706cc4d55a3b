//! Module resolution.
//!
//! Turns a `require()` specifier into a [`Target`] and renders the two pieces
//! the rewriter splices into the output: a static `.import` directive for the
//! file header and an inline expression yielding the target's exports.
//!
//! # Resolution Order
//!
//! Relative specifiers (`./x`, `../x`) always name a sibling source file.
//! Bare specifiers try, in order:
//! 1. an external package under `node_modules`
//! 2. the reserved package-manager strategy (never matches yet)
//! 3. a registered QML module
//!
//! Anything else fails, with a suggestion when the specifier looks like a
//! relative import written without `./`.

pub mod package;

use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::consts::{NAMESPACE_PREFIX, SCRIPT_EXTENSION};
use crate::error::BuildError;
use crate::manifest::{ModuleRegistry, ModuleTarget, ProjectManifest};
use crate::util::path::normalize;

pub use package::{ExternalPackage, PackageRegistry, split_package_specifier};

/// The strategy that produced a [`Target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
  /// Sibling source file addressed by a relative path.
  Local,
  /// File inside an installed external package.
  Package,
  /// Reserved for a QML package manager; declines every specifier.
  Reserved,
  /// Declaratively registered QML module.
  Registered,
}

/// Strategies tried for bare specifiers, in order.
const BARE_STRATEGIES: [Strategy; 3] = [Strategy::Package, Strategy::Reserved, Strategy::Registered];

/// Version used in a registered module's import directive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Version {
  Pinned(String),
  /// No version known; the directive is emitted without one.
  Latest,
}

/// A resolved import target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
  /// Source file next to the importer.
  Local { path: PathBuf },

  /// Source file inside an external package. `root` and `out_root` are the
  /// package's own source and output directories.
  Package {
    name: String,
    path: PathBuf,
    root: PathBuf,
    out_root: PathBuf,
  },

  /// Type exported by an installed QML module.
  Registered {
    name: String,
    module: String,
    type_name: String,
    version: Version,
  },
}

impl Target {
  pub fn strategy(&self) -> Strategy {
    match self {
      Target::Local { .. } => Strategy::Local,
      Target::Package { .. } => Strategy::Package,
      Target::Registered { .. } => Strategy::Registered,
    }
  }

  /// Source file to build, for file targets.
  pub fn source_file(&self) -> Option<&Path> {
    match self {
      Target::Local { path } | Target::Package { path, .. } => Some(path),
      Target::Registered { .. } => None,
    }
  }

  /// Expression yielding the target's exports, given its namespace.
  pub fn accessor(&self, namespace: &str) -> String {
    match self {
      Target::Local { .. } | Target::Package { .. } => format!("{}.module.exports", namespace),
      Target::Registered { type_name, .. } => format!(
        "({ns}.{ty}.module ? {ns}.{ty}.module.exports : {ns}.{ty})",
        ns = namespace,
        ty = type_name
      ),
    }
  }

  /// Import directive for a registered module. File targets use [`file_directive`].
  pub fn module_directive(&self, namespace: &str) -> Option<String> {
    match self {
      Target::Registered { module, version, .. } => Some(match version {
        Version::Pinned(v) => format!(".import {} {} as {}", module, v, namespace),
        Version::Latest => format!(".import {} as {}", module, namespace),
      }),
      _ => None,
    }
  }
}

/// Import directive for a JavaScript file, given its path relative to the
/// importing file's output directory.
pub fn file_directive(relative_path: &str, namespace: &str) -> String {
  format!(".import \"{}\" as {}", relative_path, namespace)
}

/// Namespace identifier derived from a specifier.
///
/// `./a/b-c.d` becomes `QML_a_b_c_d`; every leading `../` becomes a `_/`
/// segment, so `../util` becomes `QML___util`.
pub fn namespace_for_specifier(specifier: &str) -> String {
  let mut rest = specifier.strip_prefix("./").unwrap_or(specifier);
  let mut path = String::new();
  while let Some(stripped) = rest.strip_prefix("../") {
    path.push_str("_/");
    rest = stripped;
  }
  path.push_str(rest);

  let ident: String = path
    .chars()
    .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '$' { c } else { '_' })
    .collect();
  format!("{}_{}", NAMESPACE_PREFIX, ident)
}

/// Namespace identifier for `var <name> = require(...)`.
pub fn namespace_for_binding(name: &str) -> String {
  if name.starts_with('_') {
    format!("{}{}", NAMESPACE_PREFIX, name)
  } else {
    format!("{}_{}", NAMESPACE_PREFIX, name)
  }
}

/// Check whether a specifier is a relative path.
pub fn is_relative(specifier: &str) -> bool {
  specifier.starts_with("./") || specifier.starts_with("../")
}

/// Classifies specifiers against the module registry, the project manifest
/// and the installed packages.
#[derive(Debug, Clone, Copy)]
pub struct Resolver<'a> {
  modules: &'a ModuleRegistry,
  project: &'a ProjectManifest,
}

impl<'a> Resolver<'a> {
  pub fn new(modules: &'a ModuleRegistry, project: &'a ProjectManifest) -> Self {
    Self { modules, project }
  }

  /// Resolve `specifier` as required from a file in `importer_dir`.
  pub fn resolve(
    &self,
    specifier: &str,
    importer_dir: &Path,
    packages: &mut PackageRegistry,
  ) -> Result<Target, BuildError> {
    if specifier.trim().is_empty() {
      return Err(BuildError::InvalidImportForm {
        specifier: specifier.to_string(),
        message: "empty module specifier".to_string(),
      });
    }

    if is_relative(specifier) {
      return self.resolve_local(specifier, importer_dir);
    }

    for strategy in BARE_STRATEGIES {
      let target = match strategy {
        Strategy::Package => self.resolve_package(specifier, packages)?,
        Strategy::Reserved => self.resolve_reserved(specifier),
        Strategy::Registered => self.resolve_registered(specifier)?,
        Strategy::Local => None,
      };
      if let Some(target) = target {
        debug!(specifier, strategy = ?strategy, "resolved specifier");
        return Ok(target);
      }
    }

    if let Some(stem) = specifier.strip_suffix(".js") {
      return Err(BuildError::InvalidImportForm {
        specifier: specifier.to_string(),
        message: format!("did you mean to require './{}' instead of '{}'?", stem, specifier),
      });
    }

    if importer_dir.join(format!("{}.{}", specifier, SCRIPT_EXTENSION)).is_file() {
      return Err(BuildError::InvalidImportForm {
        specifier: specifier.to_string(),
        message: format!("did you mean to require './{}' instead of '{}'?", specifier, specifier),
      });
    }

    Err(BuildError::UnresolvedImport {
      specifier: specifier.to_string(),
      importer: importer_dir.display().to_string(),
      message: "not exported by any QML module and not found in node_modules".to_string(),
    })
  }

  fn resolve_local(&self, specifier: &str, importer_dir: &Path) -> Result<Target, BuildError> {
    if specifier.ends_with(".js") {
      return Err(BuildError::InvalidImportForm {
        specifier: specifier.to_string(),
        message: format!(
          "don't include the .js file extension when importing/requiring, use '{}'",
          &specifier[..specifier.len() - 3]
        ),
      });
    }

    let path = normalize(&importer_dir.join(format!("{}.{}", specifier, SCRIPT_EXTENSION)));
    if !path.is_file() {
      return Err(BuildError::UnresolvedImport {
        specifier: specifier.to_string(),
        importer: importer_dir.display().to_string(),
        message: format!("no such file: {}", path.display()),
      });
    }

    Ok(Target::Local { path })
  }

  fn resolve_package(&self, specifier: &str, packages: &mut PackageRegistry) -> Result<Option<Target>, BuildError> {
    let (name, subpath) = split_package_specifier(specifier);
    let Some(package) = packages.lookup(name)? else {
      trace!(specifier, "no such package");
      return Ok(None);
    };

    let path = match subpath {
      Some(subpath) => package.file(subpath),
      None => package.entry_file(),
    };
    if !path.is_file() {
      return Err(BuildError::UnresolvedImport {
        specifier: specifier.to_string(),
        importer: package.src_dir.display().to_string(),
        message: format!("package '{}' has no file {}", package.name, path.display()),
      });
    }

    Ok(Some(Target::Package {
      name: package.name.clone(),
      path,
      root: package.src_dir.clone(),
      out_root: package.out_dir.clone(),
    }))
  }

  /// Reserved for QML package manager packages, which have no on-disk layout yet.
  fn resolve_reserved(&self, specifier: &str) -> Option<Target> {
    trace!(specifier, "reserved strategy declined");
    None
  }

  fn resolve_registered(&self, specifier: &str) -> Result<Option<Target>, BuildError> {
    let Some(raw) = self.modules.get(specifier) else {
      return Ok(None);
    };
    let target = ModuleTarget::parse(specifier, raw)?;

    let version = match (self.project.version_of(specifier), target.version) {
      (Some(declared), _) => Version::Pinned(declared.to_string()),
      (None, Some(own)) => Version::Pinned(own),
      (None, None) => {
        warn!(module = %specifier, "no version specified and latest version not specified");
        Version::Latest
      }
    };

    Ok(Some(Target::Registered {
      name: specifier.to_string(),
      module: target.module,
      type_name: target.type_name,
      version,
    }))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::Fixture;

  fn modules() -> ModuleRegistry {
    ModuleRegistry::from_entries([
      ("Button", "QtQuick.Controls/Button 1.0"),
      ("Item", "QtQuick/Item"),
      ("lodash", "Shadowed/Lodash 1.0"),
    ])
  }

  fn packages(fixture: &Fixture) -> PackageRegistry {
    PackageRegistry::new(fixture.path("node_modules"), fixture.path("build/dependencies"))
  }

  #[test]
  fn namespace_from_specifier() {
    assert_eq!(namespace_for_specifier("./foo"), "QML_foo");
    assert_eq!(namespace_for_specifier("./lib/foo-bar.baz"), "QML_lib_foo_bar_baz");
    assert_eq!(namespace_for_specifier("../util"), "QML___util");
    assert_eq!(namespace_for_specifier("../../util"), "QML_____util");
    assert_eq!(namespace_for_specifier("lodash/fp"), "QML_lodash_fp");
    assert_eq!(namespace_for_specifier("@scope/pkg"), "QML__scope_pkg");
  }

  #[test]
  fn namespace_is_deterministic() {
    assert_eq!(namespace_for_specifier("./a/b"), namespace_for_specifier("./a/b"));
  }

  #[test]
  fn namespace_from_binding() {
    assert_eq!(namespace_for_binding("foo"), "QML_foo");
    assert_eq!(namespace_for_binding("_foo"), "QML_foo");
    assert_eq!(namespace_for_binding("_interop"), "QML_interop");
  }

  #[test]
  fn relative_specifier_resolves_to_sibling_file() {
    let fixture = Fixture::new();
    fixture.write("src/foo.js", "");
    fixture.write("lib/util.js", "");
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);
    let mut pkgs = packages(&fixture);

    let target = resolver.resolve("./foo", &fixture.path("src"), &mut pkgs).unwrap();
    assert_eq!(target, Target::Local { path: fixture.path("src/foo.js") });
    assert_eq!(target.accessor("QML_foo"), "QML_foo.module.exports");

    let target = resolver.resolve("../lib/util", &fixture.path("src"), &mut pkgs).unwrap();
    assert_eq!(target.source_file(), Some(fixture.path("lib/util.js").as_path()));
  }

  #[test]
  fn relative_specifier_with_extension_is_invalid() {
    let fixture = Fixture::new();
    fixture.write("foo.js", "");
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let err = resolver.resolve("./foo.js", fixture.root(), &mut packages(&fixture)).unwrap_err();
    match err {
      BuildError::InvalidImportForm { specifier, message } => {
        assert_eq!(specifier, "./foo.js");
        assert!(message.contains("'./foo'"), "{}", message);
      }
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn missing_relative_file_is_unresolved() {
    let fixture = Fixture::new();
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);
    assert!(matches!(
      resolver.resolve("./nope", fixture.root(), &mut packages(&fixture)),
      Err(BuildError::UnresolvedImport { .. })
    ));
  }

  #[test]
  fn package_wins_over_registered_module() {
    let fixture = Fixture::new();
    fixture.write("node_modules/lodash/package.json", r#"{ "main": "lodash.js" }"#);
    fixture.write("node_modules/lodash/lodash.js", "");
    fixture.write("node_modules/lodash/fp/map.js", "");
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);
    let mut pkgs = packages(&fixture);

    let target = resolver.resolve("lodash", fixture.root(), &mut pkgs).unwrap();
    assert_eq!(target.strategy(), Strategy::Package);
    assert_eq!(target.source_file(), Some(fixture.path("node_modules/lodash/lodash.js").as_path()));

    let target = resolver.resolve("lodash/fp/map", fixture.root(), &mut pkgs).unwrap();
    match target {
      Target::Package { name, path, root, out_root } => {
        assert_eq!(name, "lodash");
        assert_eq!(path, fixture.path("node_modules/lodash/fp/map.js"));
        assert_eq!(root, fixture.path("node_modules/lodash"));
        assert_eq!(out_root, fixture.path("build/dependencies/lodash"));
      }
      other => panic!("unexpected target: {:?}", other),
    }
  }

  #[test]
  fn registered_module_uses_own_version() {
    let fixture = Fixture::new();
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let target = resolver.resolve("Button", fixture.root(), &mut packages(&fixture)).unwrap();
    assert_eq!(
      target.module_directive("QML_Button").unwrap(),
      ".import QtQuick.Controls 1.0 as QML_Button"
    );
    assert_eq!(
      target.accessor("QML_Button"),
      "(QML_Button.Button.module ? QML_Button.Button.module.exports : QML_Button.Button)"
    );
  }

  #[test]
  fn project_manifest_pins_registered_version() {
    let fixture = Fixture::new();
    let registry = modules();
    let project = ProjectManifest {
      dependencies: [("Item".to_string(), "2.4".to_string()), ("Button".to_string(), "2.0".to_string())]
        .into_iter()
        .collect(),
    };
    let resolver = Resolver::new(&registry, &project);
    let mut pkgs = packages(&fixture);

    let item = resolver.resolve("Item", fixture.root(), &mut pkgs).unwrap();
    assert_eq!(item.module_directive("QML_Item").unwrap(), ".import QtQuick 2.4 as QML_Item");

    let button = resolver.resolve("Button", fixture.root(), &mut pkgs).unwrap();
    assert_eq!(button.module_directive("B").unwrap(), ".import QtQuick.Controls 2.0 as B");
  }

  #[test]
  fn unversioned_registered_module_falls_back_to_latest() {
    let fixture = Fixture::new();
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let target = resolver.resolve("Item", fixture.root(), &mut packages(&fixture)).unwrap();
    match &target {
      Target::Registered { version, .. } => assert_eq!(*version, Version::Latest),
      other => panic!("unexpected target: {:?}", other),
    }
    assert_eq!(target.module_directive("QML_Item").unwrap(), ".import QtQuick as QML_Item");
  }

  #[test]
  fn bare_name_of_local_file_suggests_relative_form() {
    let fixture = Fixture::new();
    fixture.write("src/helpers.js", "");
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let err = resolver
      .resolve("helpers", &fixture.path("src"), &mut packages(&fixture))
      .unwrap_err();
    match err {
      BuildError::InvalidImportForm { message, .. } => assert!(message.contains("'./helpers'"), "{}", message),
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn bare_specifier_with_extension_suggests_relative_form() {
    let fixture = Fixture::new();
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let err = resolver.resolve("util.js", fixture.root(), &mut packages(&fixture)).unwrap_err();
    assert!(err.to_string().contains("'./util'"), "{}", err);
  }

  #[test]
  fn unknown_bare_specifier_is_unresolved() {
    let fixture = Fixture::new();
    let (registry, project) = (modules(), ProjectManifest::default());
    let resolver = Resolver::new(&registry, &project);

    let err = resolver.resolve("left-pad", fixture.root(), &mut packages(&fixture)).unwrap_err();
    match err {
      BuildError::UnresolvedImport { specifier, .. } => assert_eq!(specifier, "left-pad"),
      other => panic!("unexpected error: {:?}", other),
    }
  }

  #[test]
  fn file_directive_format() {
    assert_eq!(file_directive("foo.js", "QML_foo"), ".import \"foo.js\" as QML_foo");
  }
}

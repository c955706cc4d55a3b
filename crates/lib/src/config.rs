//! Build configuration.
//!
//! Options come from CLI flags; a few environment variables override the
//! locations of external collaborators:
//! - `QMLBRIDGE_BABEL`: lowering command (default `babel`)
//! - `QMLBRIDGE_QML_ROOT`: QML installation root scanned for module manifests

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::consts::{
  CACHE_FILENAME, DEFAULT_LOWERING_COMMAND, DEPENDENCIES_OUT_DIR, PACKAGES_DIR, PROJECT_MANIFEST_FILENAME,
};
use crate::util::path::normalize;

/// Environment variable overriding the lowering command.
pub const LOWERING_COMMAND_ENV: &str = "QMLBRIDGE_BABEL";

/// Environment variable overriding the QML installation root.
pub const QML_ROOT_ENV: &str = "QMLBRIDGE_QML_ROOT";

/// Options for one build session.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  /// Directory receiving the rewritten tree (absolute).
  pub build_dir: PathBuf,

  /// Working directory holding the cache, `package.yml` and `node_modules` (absolute).
  pub work_dir: PathBuf,

  /// Inject the polyfill prologue into every rewritten file.
  pub use_polyfills: bool,

  /// Run sources through the external lowering compiler before rewriting.
  pub use_lowering: bool,

  /// Program invoked as `<command> <file>` when lowering is enabled.
  pub lowering_command: String,

  /// Timestamp of the engine itself. Outputs older than this are rebuilt.
  pub engine_stamp: Option<SystemTime>,
}

impl BuildOptions {
  /// Create options for building into `build_dir` from `work_dir`.
  ///
  /// A relative `build_dir` is taken relative to `work_dir`.
  pub fn new(work_dir: impl Into<PathBuf>, build_dir: impl AsRef<Path>) -> Self {
    let work_dir = normalize(&work_dir.into());
    let build_dir = normalize(&work_dir.join(build_dir));

    Self {
      build_dir,
      work_dir,
      use_polyfills: true,
      use_lowering: true,
      lowering_command: lowering_command(),
      engine_stamp: engine_stamp(),
    }
  }

  pub fn with_polyfills(mut self, enabled: bool) -> Self {
    self.use_polyfills = enabled;
    self
  }

  pub fn with_lowering(mut self, enabled: bool) -> Self {
    self.use_lowering = enabled;
    self
  }

  pub fn with_engine_stamp(mut self, stamp: Option<SystemTime>) -> Self {
    self.engine_stamp = stamp;
    self
  }

  /// Path of the persisted build cache.
  pub fn cache_path(&self) -> PathBuf {
    self.work_dir.join(CACHE_FILENAME)
  }

  /// Path of the optional project manifest.
  pub fn project_manifest_path(&self) -> PathBuf {
    self.work_dir.join(PROJECT_MANIFEST_FILENAME)
  }

  /// Root directory of installed external packages.
  pub fn packages_dir(&self) -> PathBuf {
    self.work_dir.join(PACKAGES_DIR)
  }

  /// Output root for rewritten external packages.
  pub fn dependencies_out_dir(&self) -> PathBuf {
    self.build_dir.join(DEPENDENCIES_OUT_DIR)
  }
}

/// Returns the lowering command, honoring `QMLBRIDGE_BABEL`.
pub fn lowering_command() -> String {
  std::env::var(LOWERING_COMMAND_ENV)
    .ok()
    .filter(|s| !s.trim().is_empty())
    .unwrap_or_else(|| DEFAULT_LOWERING_COMMAND.to_string())
}

/// Modification time of the running executable.
///
/// Returns `None` when it cannot be determined, which disables that part of
/// the staleness check.
pub fn engine_stamp() -> Option<SystemTime> {
  let exe = std::env::current_exe().ok()?;
  std::fs::metadata(exe).and_then(|m| m.modified()).ok()
}

/// Returns the QML installation root scanned for module manifests.
///
/// `QMLBRIDGE_QML_ROOT` wins; otherwise `qmake -query QT_INSTALL_QML` is asked.
pub fn qml_install_root() -> Option<PathBuf> {
  if let Ok(root) = std::env::var(QML_ROOT_ENV)
    && !root.trim().is_empty()
  {
    return Some(PathBuf::from(root));
  }

  let output = match Command::new("qmake").args(["-query", "QT_INSTALL_QML"]).output() {
    Ok(output) => output,
    Err(e) => {
      warn!(error = %e, "qmake not available, no QML modules will be registered");
      return None;
    }
  };

  if !output.status.success() {
    warn!(code = ?output.status.code(), "qmake -query failed, no QML modules will be registered");
    return None;
  }

  let root = String::from_utf8_lossy(&output.stdout).trim().to_string();
  debug!(root = %root, "QML installation root from qmake");
  if root.is_empty() { None } else { Some(PathBuf::from(root)) }
}

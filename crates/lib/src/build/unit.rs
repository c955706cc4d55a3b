//! Build units: one record per source file per session.

use std::collections::BTreeSet;
use std::fs;
use std::ffi::OsStr;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use crate::cache::CacheEntry;
use crate::consts::SCRIPT_EXTENSION;
use crate::error::BuildError;
use crate::util::path::{display_key, normalize, relative};

/// Where a unit's output goes and how its source is read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
  /// Base directory the output path is computed from.
  pub root: PathBuf,
  /// Directory mirroring `root` in the build tree.
  pub out_root: PathBuf,
  /// Run the source through the lowering compiler first.
  pub lower: bool,
}

/// What happened to a unit during the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitState {
  /// Output was regenerated by the rewriter.
  Rewritten,
  /// Non-script asset copied byte for byte.
  Copied,
  /// Output was fresh; dependency data came from the cache.
  Cached,
  /// Output was fresh and there was nothing to restore.
  UpToDate,
}

/// One source file's build record.
#[derive(Debug, Clone)]
pub struct BuildUnit {
  /// Absolute input path.
  pub path: PathBuf,
  /// Input path as shown to users and stored in the cache.
  pub key: String,
  /// Absolute output path.
  pub out_path: PathBuf,
  /// Source paths of file dependencies.
  pub dependencies: Vec<PathBuf>,
  /// Registered QML modules required by the file.
  pub modules: Vec<String>,
  /// Own and inherited implicit globals.
  pub globals: BTreeSet<String>,
  pub state: UnitState,
}

impl BuildUnit {
  /// Locate `path` within `scope`.
  ///
  /// Files outside the scope root keep their position relative to it, with
  /// every `..` turned into a `_` directory so the output stays inside
  /// `out_root`.
  pub fn new(path: &Path, scope: &Scope, work_dir: &Path) -> Self {
    let path = normalize(path);
    let rel: PathBuf = relative(&path, &scope.root)
      .components()
      .map(|c| match c {
        Component::ParentDir => Component::Normal(OsStr::new("_")),
        other => other,
      })
      .collect();
    let out_path = normalize(&scope.out_root.join(rel));
    Self {
      key: display_key(&path, work_dir),
      path,
      out_path,
      dependencies: Vec::new(),
      modules: Vec::new(),
      globals: BTreeSet::new(),
      state: UnitState::UpToDate,
    }
  }

  /// Whether the file is rewritten rather than copied.
  pub fn is_script(&self) -> bool {
    self.path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION)
  }

  /// Directory holding the source file.
  pub fn dir(&self) -> &Path {
    self.path.parent().unwrap_or(Path::new(""))
  }

  /// Whether the output has to be regenerated.
  ///
  /// Stale when the output is missing, or older than the source or than the
  /// engine itself.
  pub fn is_stale(&self, engine_stamp: Option<SystemTime>) -> Result<bool, BuildError> {
    let out_mtime = match fs::metadata(&self.out_path).and_then(|m| m.modified()) {
      Ok(mtime) => mtime,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
      Err(e) => return Err(BuildError::io(&self.out_path, e)),
    };
    let src_mtime = fs::metadata(&self.path)
      .and_then(|m| m.modified())
      .map_err(|e| BuildError::io(&self.path, e))?;

    Ok(src_mtime > out_mtime || engine_stamp.is_some_and(|stamp| stamp > out_mtime))
  }

  /// Load dependency data from a cache entry.
  pub fn restore(&mut self, entry: &CacheEntry) {
    self.dependencies = entry.resolve_dependencies(self.dir());
    self.modules = entry.modules.clone();
    self.globals = entry.globals.iter().cloned().collect();
  }

  /// Cache entry describing the unit.
  pub fn cache_entry(&self) -> CacheEntry {
    CacheEntry::new(self.dir(), &self.dependencies, &self.globals, &self.modules)
  }

  /// Write `text` to the output path, creating parent directories.
  pub fn write_output(&self, text: &str) -> Result<(), BuildError> {
    self.ensure_out_dir()?;
    fs::write(&self.out_path, text).map_err(|e| BuildError::io(&self.out_path, e))
  }

  /// Copy the source verbatim to the output path.
  pub fn copy_output(&self) -> Result<(), BuildError> {
    self.ensure_out_dir()?;
    fs::copy(&self.path, &self.out_path).map_err(|e| BuildError::io(&self.path, e))?;
    Ok(())
  }

  fn ensure_out_dir(&self) -> Result<(), BuildError> {
    match self.out_path.parent() {
      Some(parent) => fs::create_dir_all(parent).map_err(|e| BuildError::io(parent, e)),
      None => Ok(()),
    }
  }
}

//! Lexical path helpers.
//!
//! Build units are keyed by absolute paths, so every path entering the engine
//! is normalized without touching the filesystem (the file may not exist yet).

use std::path::{Component, Path, PathBuf};

/// Normalize a path by resolving `.` and `..` components lexically.
pub fn normalize(path: &Path) -> PathBuf {
  let mut normalized = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        if !normalized.pop() {
          normalized.push("..");
        }
      }
      other => normalized.push(other.as_os_str()),
    }
  }
  normalized
}

/// Compute `path` relative to the directory `base`.
///
/// Falls back to `path` itself when no relative form exists (e.g. different
/// prefixes on Windows).
pub fn relative(path: &Path, base: &Path) -> PathBuf {
  pathdiff::diff_paths(path, base).unwrap_or_else(|| path.to_path_buf())
}

/// Render a path with forward slashes, as QML import directives expect.
pub fn to_slash(path: &Path) -> String {
  path.to_string_lossy().replace('\\', "/")
}

/// Key used for a path in the cache and in diagnostics: relative to `work_dir`
/// when the path lies inside it, absolute otherwise.
pub fn display_key(path: &Path, work_dir: &Path) -> String {
  match path.strip_prefix(work_dir) {
    Ok(rel) if !rel.as_os_str().is_empty() => to_slash(rel),
    _ => to_slash(path),
  }
}

/// Check whether two paths name the same file or directory.
///
/// Compares device and inode on Unix so symlinked spellings of the same
/// directory match. Returns `false` if either path cannot be inspected.
#[cfg(unix)]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
  use std::os::unix::fs::MetadataExt;

  match (std::fs::metadata(a), std::fs::metadata(b)) {
    (Ok(ma), Ok(mb)) => ma.dev() == mb.dev() && ma.ino() == mb.ino(),
    _ => false,
  }
}

/// Check whether two paths name the same file or directory.
#[cfg(not(unix))]
pub fn is_same_file(a: &Path, b: &Path) -> bool {
  match (dunce::canonicalize(a), dunce::canonicalize(b)) {
    (Ok(ca), Ok(cb)) => ca == cb,
    _ => false,
  }
}

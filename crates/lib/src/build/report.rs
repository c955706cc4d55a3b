//! Summary of one build session.

use serde::Serialize;

/// What was done to a rebuilt file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildAction {
  Rewritten,
  Copied,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BuiltFile {
  pub file: String,
  pub action: BuildAction,
}

/// Files touched by a session, keyed by their display path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildReport {
  /// Rebuilt files, dependencies before the files requiring them.
  pub built: Vec<BuiltFile>,
  /// Files whose output was already up to date.
  pub up_to_date: Vec<String>,
}

impl BuildReport {
  pub(crate) fn record(&mut self, file: &str, action: BuildAction) {
    self.built.push(BuiltFile {
      file: file.to_string(),
      action,
    });
  }

  pub(crate) fn record_fresh(&mut self, file: &str) {
    self.up_to_date.push(file.to_string());
  }

  pub fn rewritten(&self) -> impl Iterator<Item = &str> {
    self.files_with(BuildAction::Rewritten)
  }

  pub fn copied(&self) -> impl Iterator<Item = &str> {
    self.files_with(BuildAction::Copied)
  }

  fn files_with(&self, action: BuildAction) -> impl Iterator<Item = &str> {
    self
      .built
      .iter()
      .filter(move |f| f.action == action)
      .map(|f| f.file.as_str())
  }

  /// Whether nothing had to be rebuilt.
  pub fn is_noop(&self) -> bool {
    self.built.is_empty()
  }
}

//! External lowering compiler.
//!
//! Sources written in newer JavaScript are lowered to a baseline QML's engine
//! understands before they are rewritten. The compiler is an opaque
//! subprocess: `<command> <file>` prints the lowered source on stdout.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::BuildError;

/// Text-to-text lowering of one source file.
pub trait Lowering {
  /// Return the lowered contents of `path`.
  fn lower(&self, path: &Path) -> Result<String, BuildError>;
}

/// Lowering through an external command such as `babel`.
#[derive(Debug, Clone)]
pub struct CommandLowering {
  command: String,
}

impl CommandLowering {
  pub fn new(command: impl Into<String>) -> Self {
    Self { command: command.into() }
  }

  pub fn command(&self) -> &str {
    &self.command
  }
}

impl Lowering for CommandLowering {
  fn lower(&self, path: &Path) -> Result<String, BuildError> {
    debug!(command = %self.command, file = %path.display(), "lowering source");

    let output = Command::new(&self.command)
      .arg(path)
      .output()
      .map_err(|e| BuildError::LoweringFailure {
        path: path.to_path_buf(),
        message: format!("failed to run '{}': {}", self.command, e),
      })?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
      let message = if stderr.is_empty() {
        format!("'{}' exited with status {:?}", self.command, output.status.code())
      } else {
        stderr
      };
      return Err(BuildError::LoweringFailure {
        path: path.to_path_buf(),
        message,
      });
    }

    String::from_utf8(output.stdout).map_err(|e| BuildError::LoweringFailure {
      path: path.to_path_buf(),
      message: format!("output is not valid UTF-8: {}", e),
    })
  }
}

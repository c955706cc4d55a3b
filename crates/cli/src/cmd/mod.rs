mod build;
mod info;

use std::process::ExitCode;

use qmlbridge_lib::BuildError;

use crate::output::{print_error, symbols};

pub use build::{BuildArgs, cmd_build};
pub use info::cmd_info;

/// Exit status for a dependency cycle.
const EXIT_CYCLE: u8 = 1;

/// Exit status for every other failure.
const EXIT_FAILURE: u8 = 2;

/// Print a failed command's error and pick the exit status.
///
/// A dependency cycle prints the chain of files, in traversal order.
pub fn report_failure(err: &anyhow::Error) -> ExitCode {
  let chain = err
    .chain()
    .find_map(|cause| cause.downcast_ref::<BuildError>())
    .and_then(BuildError::cycle_chain);

  match chain {
    Some(chain) => {
      print_error("Dependency cycle:");
      for file in chain {
        eprintln!(" {} {}", symbols::MINUS, file);
      }
      ExitCode::from(EXIT_CYCLE)
    }
    None => {
      print_error(&format!("{:#}", err));
      ExitCode::from(EXIT_FAILURE)
    }
  }
}

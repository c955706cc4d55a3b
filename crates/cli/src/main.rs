mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::{BuildArgs, cmd_build, cmd_info, report_failure};
use output::OutputFormat;

/// qmlbridge - build CommonJS sources into QML JavaScript libraries
#[derive(Parser)]
#[command(name = "qmlbridge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Rewrite source files into a build directory
  Build {
    /// One or more source files or directories, followed by the build directory
    #[arg(value_name = "PATH", num_args = 2.., required_unless_present = "modules")]
    paths: Vec<PathBuf>,

    /// Don't include the ES6 polyfills
    #[arg(long)]
    no_polyfills: bool,

    /// Don't run babel before rewriting
    #[arg(long)]
    no_babel: bool,

    /// Show the QML modules mapped to ES6 module names and exit
    #[arg(long)]
    modules: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Show build environment information
  Info {
    /// Output format
    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command {
    Commands::Build {
      paths,
      no_polyfills,
      no_babel,
      modules,
      output,
    } => cmd_build(BuildArgs {
      paths,
      no_polyfills,
      no_babel,
      show_modules: modules,
      output,
    }),
    Commands::Info { output } => cmd_info(output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => report_failure(&err),
  }
}

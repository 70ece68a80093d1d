//! vsimbuild: builds a Verilator simulator, its auxiliary objects and its
//! modules.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use vsimbuild_lib::config::BuildOverrides;
use vsimbuild_lib::execute::{BuildError, Target};

use crate::output::{OutputFormat, print_error};

/// vsimbuild - build orchestrator for Verilator simulators
#[derive(Parser)]
#[command(name = "vsimbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
  #[command(flatten)]
  global: GlobalOpts,

  #[command(subcommand)]
  command: Option<Commands>,
}

/// Options shared by every subcommand. Each one mirrors an environment
/// variable and takes precedence over it.
#[derive(Args, Debug, Default)]
pub struct GlobalOpts {
  /// C compiler for auxiliary sources, e.g. "clang" or "ccache gcc" [env: CC]
  #[arg(long, global = true)]
  pub cc: Option<String>,

  /// Build with coverage instrumentation [env: COVERAGE]
  #[arg(long, global = true)]
  pub coverage: bool,

  /// Enable waveform tracing [env: TRACE]
  #[arg(long, global = true)]
  pub trace: bool,

  /// Enable FST waveform tracing, implies --trace [env: TRACE_FST]
  #[arg(long, global = true)]
  pub trace_fst: bool,

  /// Allow saving and restoring simulator state [env: SAVABLE]
  #[arg(long, global = true)]
  pub savable: bool,

  /// Link the SDL2 video frontend [env: VIDEO]
  #[arg(long, global = true)]
  pub video: bool,

  /// Simulator threads; values of 0 or less mean single-threaded [env: THREADS]
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub threads: Option<String>,

  /// Parallel jobs for the native build; unset means unlimited [env: JOBS]
  #[arg(long, global = true)]
  pub jobs: Option<String>,

  /// Optimization flag for auxiliary sources [env: OPT_LEVEL]
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub opt_level: Option<String>,

  /// Hardware sources handed to Verilator [env: CC_SRCS]
  #[arg(long, global = true, allow_hyphen_values = true)]
  pub cc_srcs: Option<String>,

  /// Build output directory [env: BUILD_DIR]
  #[arg(long, global = true)]
  pub build_dir: Option<PathBuf>,

  /// Project file (default: ./vsimbuild.toml when present)
  #[arg(long, global = true)]
  pub config: Option<PathBuf>,

  /// Maximum number of tools running at once (default: CPU count)
  #[arg(long, global = true)]
  pub parallel: Option<usize>,

  /// Print the commands without running them
  #[arg(short = 'n', long, global = true)]
  pub dry_run: bool,

  /// Enable verbose output
  #[arg(short, long, global = true)]
  pub verbose: bool,
}

impl GlobalOpts {
  /// Overrides given on the command line. Switches only ever enable a feature.
  pub fn overrides(&self) -> BuildOverrides {
    let flag = |set: bool| set.then_some(true);
    BuildOverrides {
      cc: self.cc.clone(),
      coverage: flag(self.coverage),
      trace: flag(self.trace),
      trace_fst: flag(self.trace_fst),
      savable: flag(self.savable),
      video: flag(self.video),
      threads: self.threads.clone(),
      jobs: self.jobs.clone(),
      opt_level: self.opt_level.clone(),
      cc_srcs: self.cc_srcs.clone(),
      verilator: None,
      make: None,
      build_dir: self.build_dir.clone(),
      parallelism: self.parallel,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Build the modules and the simulator (default)
  All,

  /// Build the simulator only
  Sim,

  /// Build the modules only
  Modules,

  /// Remove the build output directory
  Clean,

  /// Show the platform and the resolved build configuration
  Info {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.global.verbose { "debug" } else { "info" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let result = match cli.command.unwrap_or(Commands::All) {
    Commands::All => cmd::cmd_build(Target::All, &cli.global),
    Commands::Sim => cmd::cmd_build(Target::Sim, &cli.global),
    Commands::Modules => cmd::cmd_build(Target::Modules, &cli.global),
    Commands::Clean => cmd::cmd_clean(&cli.global),
    Commands::Info { output } => cmd::cmd_info(&cli.global, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format!("{:#}", err));
      ExitCode::from(exit_code(&err))
    }
  }
}

/// A failing tool's exit code, 130 after an interrupt, or 1.
fn exit_code(err: &anyhow::Error) -> u8 {
  err.downcast_ref::<BuildError>().map_or(1, BuildError::exit_code)
}

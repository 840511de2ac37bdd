use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

use cmd::{cmd_check, cmd_formula, cmd_run, cmd_values};

/// deck - evaluate deck values and run slide scripts
#[derive(Parser)]
#[command(name = "deck")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Emit logs as JSON lines
  #[arg(long, global = true)]
  log_json: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Print every named value's effective value
  Values {
    /// Path to the project snapshot
    project: PathBuf,

    /// Only this page (1-based); every page when omitted
    #[arg(short, long)]
    page: Option<usize>,
  },

  /// Evaluate an ad-hoc formula
  Formula {
    /// Path to the project snapshot
    project: PathBuf,

    /// Formula text, e.g. "%{base} * 2 + %p"
    text: String,

    /// Page to evaluate on (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,
  },

  /// Report naming problems and broken formulas
  Check {
    /// Path to the project snapshot
    project: PathBuf,
  },

  /// Run a script instance and print its SVG fragment
  Run {
    /// Path to the project snapshot
    project: PathBuf,

    /// Id of the script instance on the page
    instance: String,

    /// Page the instance is placed on (1-based)
    #[arg(short, long, default_value_t = 1)]
    page: usize,

    /// Advisory time budget in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Print the full execution result as JSON
    #[arg(long)]
    json: bool,
  },
}

fn init_logging(verbose: bool, json: bool) {
  let default_level = if verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  let builder = tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time();

  if json {
    builder.json().init();
  } else {
    builder.init();
  }
}

fn main() -> Result<()> {
  let cli = Cli::parse();
  init_logging(cli.verbose, cli.log_json);

  match cli.command {
    Commands::Values { project, page } => cmd_values(&project, page),
    Commands::Formula { project, text, page } => cmd_formula(&project, &text, page),
    Commands::Check { project } => cmd_check(&project),
    Commands::Run {
      project,
      instance,
      page,
      timeout_ms,
      json,
    } => cmd_run(&project, &instance, page, timeout_ms, json),
  }
}

//! sbind - bind JSON values into a namespaced key-value store.

mod cmd;
mod config;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use config::Target;
use output::OutputFormat;

/// Bind JSON values into a namespaced key-value store
#[derive(Parser)]
#[command(name = "sbind")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Directory holding the store's area files (default: $SBIND_STORE, then
  /// the platform data directory)
  #[arg(long, global = true)]
  store: Option<PathBuf>,

  /// Storage area to operate on: sync, local, or managed
  #[arg(long, global = true, default_value = "local")]
  area: String,

  /// Output format
  #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
  format: OutputFormat,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Read the value a name points at
  Get {
    /// Dotted path into the area, e.g. profile.theme
    name: String,

    /// Value reported when the store has nothing under the name
    /// (JSON, or a bare string)
    #[arg(long)]
    default: Option<String>,
  },

  /// Write a value under a name
  Set {
    /// Dotted path into the area
    name: String,

    /// JSON value; anything that does not parse is stored as a string
    value: String,
  },

  /// Delete top-level keys, matched literally
  Remove {
    #[arg(required = true)]
    names: Vec<String>,
  },

  /// Wipe every entry in the area
  Clear,

  /// Measure the bytes the named keys occupy (whole area when no name given)
  Usage { names: Vec<String> },
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::from_default_env())
    .without_time()
    .init();

  if let Err(err) = run() {
    output::print_error(&format!("{err:#}"));
    std::process::exit(1);
  }
}

fn run() -> Result<()> {
  let cli = Cli::parse();

  let target = Target {
    store_dir: config::resolve_store_dir(cli.store)?,
    area: cli.area.parse()?,
    format: cli.format,
  };

  match cli.command {
    Commands::Get { name, default } => cmd::cmd_get(&target, &name, default.as_deref()),
    Commands::Set { name, value } => cmd::cmd_set(&target, &name, &value),
    Commands::Remove { names } => cmd::cmd_remove(&target, &names),
    Commands::Clear => cmd::cmd_clear(&target),
    Commands::Usage { names } => cmd::cmd_usage(&target, &names),
  }
}

mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use forge_lib::recipe::BuildPolicy;
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_create, cmd_detect, cmd_info};
use crate::output::OutputFormat;

/// forge - build, test and package CMake libraries from a recipe
#[derive(Parser)]
#[command(name = "forge")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Export sources, build, test and install a package into the store
  Create {
    /// Directory holding the package sources
    #[arg(default_value = ".")]
    source: PathBuf,

    /// Lua recipe file (default: the built-in encryption-lib recipe)
    #[arg(short, long)]
    recipe: Option<PathBuf>,

    /// Setting override, e.g. -s build_type=debug -s compiler=gcc
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    settings: Vec<String>,

    /// Build policy overriding the recipe's: missing, always or never
    #[arg(long, value_name = "POLICY")]
    build: Option<BuildPolicy>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show package metadata for the given settings
  Info {
    /// Lua recipe file (default: the built-in encryption-lib recipe)
    #[arg(short, long)]
    recipe: Option<PathBuf>,

    /// Setting override, e.g. -s os=windows
    #[arg(short = 's', long = "setting", value_name = "KEY=VALUE")]
    settings: Vec<String>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Print the settings detected for this host
  Detect {
    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = if cli.verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::from_default_env()
  };
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Create {
      source,
      recipe,
      settings,
      build,
      output,
    } => cmd_create(&source, recipe.as_deref(), &settings, build, output),
    Commands::Info {
      recipe,
      settings,
      output,
    } => cmd_info(recipe.as_deref(), &settings, output),
    Commands::Detect { output } => cmd_detect(output),
  }
}

//! GloVis CLI - Command-line interface
//!
//! Manages the configuration file and scene-list files used by the GloVis
//! browsing library.

mod commands;
mod error;

use clap::{Parser, Subcommand};
use glovis::config::ConfigFile;
use glovis::logging::{init_logging, WorkerGuard};

use commands::config::ConfigCommands;
use commands::scene_list::SceneListCommands;
use error::CliError;

#[derive(Debug, Parser)]
#[command(name = "glovis", version = glovis::VERSION)]
#[command(about = "Browse and filter satellite scene imagery", long_about = None)]
struct Cli {
    /// Override the configured log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// View or change configuration settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List supported sensors
    Sensors,

    /// Work with scene-list files
    SceneList {
        #[command(subcommand)]
        command: SceneListCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    // Keep the guard so buffered log lines are flushed on exit.
    let _guard = match setup_logging(cli.log_level.as_deref()) {
        Ok(guard) => guard,
        Err(e) => e.exit(),
    };

    let result = match cli.command {
        Commands::Config { command } => commands::config::run(command),
        Commands::Sensors => commands::sensors::run(),
        Commands::SceneList { command } => commands::scene_list::run(command),
    };

    if let Err(e) = result {
        e.exit();
    }
}

fn setup_logging(level: Option<&str>) -> Result<Option<WorkerGuard>, CliError> {
    // Commands report a broken config file themselves.
    let mut logging = ConfigFile::load()
        .map(|c| c.logging)
        .unwrap_or_default();
    if let Some(level) = level {
        logging.level = level.to_string();
    }
    Ok(init_logging(&logging)?)
}

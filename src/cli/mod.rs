//! Command-line interface for genrepo.

pub mod args;
mod commands;

use clap::{Parser, Subcommand};
use thiserror::Error;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::app::{App, AppError};

pub use args::{GlobalArgs, OutputSink};

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur during CLI execution.
#[derive(Debug, Error)]
pub enum CliError {
    /// Argument processing error.
    #[error("{0}")]
    Args(#[from] args::ArgsError),

    /// App error.
    #[error("{0}")]
    App(#[from] AppError),

    /// Repository error.
    #[error("{0}")]
    Repo(#[from] crate::repo::RepoError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

// =============================================================================
// CLI Definition
// =============================================================================

/// genrepo - Manage collections and files in a Fedora repository.
#[derive(Parser, Debug)]
#[command(name = "genrepo", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Collection operations.
    Collection {
        #[command(subcommand)]
        command: commands::collection::CollectionCommand,
    },

    /// File operations.
    File {
        #[command(subcommand)]
        command: commands::file::FileCommand,
    },

    /// Show the table used to classify file objects.
    Kinds(commands::kinds::KindsArgs),
}

// =============================================================================
// CLI Execution
// =============================================================================

/// Install the global subscriber. `RUST_LOG` wins over the configured level;
/// `--verbose` raises the configured level to `debug`.
fn init_tracing(verbose: bool, configured_level: &str) {
    let filter = if verbose { "debug" } else { configured_level };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();
}

impl Cli {
    /// Parse command-line arguments and return the CLI instance.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Run the CLI command.
    pub async fn run(self) -> Result<()> {
        let app = App::new(self.global.to_app_context())?;
        init_tracing(self.global.verbose, &app.config().config().logging.level);
        for warning in app.config_warnings() {
            warn!("{}", warning);
        }

        match self.command {
            Command::Collection { command } => command.run(&app, &self.global).await,
            Command::File { command } => command.run(&app, &self.global).await,
            Command::Kinds(args) => args.run(&app, &self.global).await,
        }
    }
}

/// Main entry point for the CLI.
pub async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    cli.run().await
}

//! # vitrine CLI entry point
//!
//! Parses command-line arguments, initializes logging, and dispatches to
//! the subcommand handlers in `vitrine_cli`.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use vitrine_cli::connection::{run_configure, run_forget, run_show_config, run_verify, ConfigureArgs};
use vitrine_cli::list::{run_list, ListArgs};
use vitrine_cli::publish::{run_publish, PublishArgs};
use vitrine_cli::Session;

/// Publish images into a collection's gallery manifest.
///
/// The manifest and images live in a hosted repository. Every publish
/// uploads the image, then commits the updated manifest against the
/// version it read; if the manifest changed in between, the publish is
/// refused and can be run again.
#[derive(Parser, Debug)]
#[command(name = "vitrine", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the saved connection file.
    #[arg(long, global = true, env = "VITRINE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify access to a collection and save the connection.
    Configure(ConfigureArgs),

    /// Re-check the saved connection's write access and visibility.
    Verify,

    /// Upload an image and add it to the manifest.
    Publish(PublishArgs),

    /// List the published catalog.
    List(ListArgs),

    /// Print the saved connection with the credential redacted.
    ShowConfig,

    /// Remove the saved connection.
    Forget,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "vitrine starting");

    let session = match Session::from_env(cli.config) {
        Ok(session) => session,
        Err(e) => {
            tracing::error!("{e:#}");
            return ExitCode::from(1);
        }
    };
    tracing::debug!(config = %session.config.path().display(), "resolved config location");

    let result = match &cli.command {
        Commands::Configure(args) => run_configure(args, &session).await,
        Commands::Verify => run_verify(&session).await,
        Commands::Publish(args) => run_publish(args, &session).await,
        Commands::List(args) => run_list(args, &session).await,
        Commands::ShowConfig => run_show_config(&session),
        Commands::Forget => run_forget(&session),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

//! SmartSOC CLI: terminal dashboard, JSON API server, and chat REPL for the
//! threat simulator.

mod commands;
mod repl;

use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// SmartSOC: a simulated security operations center
#[derive(Parser, Debug)]
#[command(name = "smartsoc", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (reads `.smartsoc/config.toml` from here)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the simulation with the live feed printed to stdout
    Run {
        /// Stop after this many seconds (runs until Ctrl-C if omitted)
        #[arg(short, long)]
        duration: Option<u64>,

        /// Seed for reproducible runs
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Serve the JSON dashboard API
    Serve {
        /// Bind host (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Start generating events immediately
        #[arg(long)]
        start: bool,
    },
    /// Chat with the SOC assistant while the simulation runs in the background
    Chat,
    /// Inspect or clear the stored chat transcript
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
enum HistoryAction {
    /// Print the transcript
    Show {
        /// Print raw JSON instead of formatted turns
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored turn
    Clear,
}

#[derive(clap::Subcommand, Debug)]
enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,
    /// Write a default `.smartsoc/config.toml` into the workspace
    Init,
}

fn log_filter(verbose: u8, quiet: bool) -> &'static str {
    match verbose {
        0 if quiet => "error",
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Daily rolling JSON log writer under `dir`, creating it if needed.
fn file_log_writer(dir: &Path) -> std::io::Result<(NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let file_appender = tracing_appender::rolling::daily(dir, "smartsoc.log");
    Ok(tracing_appender::non_blocking(file_appender))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(log_filter(cli.verbose, cli.quiet)));

    let log_dir = smartsoc_core::config::data_dir().join("logs");
    let (json_layer, _guard, log_dir_error) = match file_log_writer(&log_dir) {
        Ok((writer, guard)) => {
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard), None)
        }
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    if let Some(e) = log_dir_error {
        tracing::warn!(dir = %log_dir.display(), error = %e, "File logging disabled");
    }

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace).await
}

//! CLI for forge-sync.
//!
//! Mirrors GitHub issues and pull requests onto the Jira tickets they
//! mention, either for every open item (`sync`) or for a single webhook
//! delivery (`event`).

use clap::{Parser, Subcommand};
use forge_sync::{RunSummary, Runner, RunnerConfig, RunnerError};
use std::path::PathBuf;
use std::process::ExitCode;
use thiserror::Error;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// forge-sync - Link GitHub issues and pull requests to the tickets they mention.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the sync config file.
    #[arg(long, env = "FORGE_SYNC_CONFIG", default_value = "sync.toml", global = true)]
    config: PathBuf,

    /// GitHub Personal Access Token.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    github_token: Option<String>,

    /// Log what would happen without writing to the tracker.
    #[arg(long, global = true)]
    testing: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sync every open issue and pull request of the mapped projects.
    Sync {
        /// Only sync this project (owner/name).
        #[arg(long)]
        repo: Option<String>,
    },

    /// Process a single webhook payload read from a file.
    Event {
        /// Path to the JSON payload.
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    // Ignore the error if another provider is already installed.
    let _ = rustls::crypto::aws_lc_rs::default_provider().install_default();

    let args = Args::parse();

    match run(args).await {
        Ok(summary) => {
            print_summary(&summary);

            if summary.has_failures() {
                ExitCode::from(1)
            } else {
                ExitCode::from(0)
            }
        }
        Err(e) => {
            error!(error = %e, "Critical failure");
            ExitCode::from(2)
        }
    }
}

/// Initializes tracing with environment filter support.
///
/// Sets up the global tracing subscriber with:
/// - Compact log formatting (single-line output)
/// - Log level filtering via `RUST_LOG` env var (defaults to "info")
fn init_tracing() {
    tracing_subscriber::registry()
        .with(fmt::layer().compact().with_target(false))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Errors that end the process before a summary exists.
#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Runner(#[from] RunnerError),

    #[error("Failed to read payload {}: {source}", .path.display())]
    Payload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Main execution logic.
async fn run(args: Args) -> Result<RunSummary, CliError> {
    let config = RunnerConfig::new(args.config, args.github_token, args.testing);

    match args.command {
        Command::Sync { repo } => {
            let runner = Runner::new(config.with_repo(repo))?;
            Ok(runner.run().await?)
        }
        Command::Event { file } => {
            let payload = std::fs::read(&file).map_err(|source| CliError::Payload {
                path: file.clone(),
                source,
            })?;
            let runner = Runner::new(config)?;
            Ok(runner.handle_event(&payload).await?)
        }
    }
}

/// Prints the final run summary.
fn print_summary(summary: &RunSummary) {
    println!("\nSummary:");
    println!(
        "  Mode: {}",
        if summary.testing { "Testing" } else { "Live" }
    );
    println!("  Items processed: {}", summary.items_processed);
    println!("  Items skipped: {}", summary.items_skipped);
    println!("  Items failed: {}", summary.items_failed);

    if summary.fetch_failures > 0 {
        println!("  Projects not fetched: {}", summary.fetch_failures);
    }

    if !summary.testing {
        println!("  Tickets updated: {}", summary.tickets_updated);
        println!("  Links attached: {}", summary.links_attached);
        println!("  Comments added: {}", summary.comments_added);
        println!("  Transitions applied: {}", summary.transitions_applied);
        println!("  Tickets created: {}", summary.tickets_created);
        println!("  Comments mirrored: {}", summary.comments_mirrored);
        println!("  Fields updated: {}", summary.fields_updated);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_payload_is_reported_with_its_path() {
        let args = Args::parse_from(["forge-sync", "event", "/nonexistent/payload.json"]);
        let result = run(args).await;

        match result {
            Err(e @ CliError::Payload { .. }) => {
                assert!(e.to_string().starts_with("Failed to read payload /nonexistent/payload.json: "));
                assert!(std::error::Error::source(&e).is_some());
            }
            other => panic!("expected payload error, got {other:?}"),
        }
    }
}

//! sigma-tap - Stripe Sigma scheduled query extraction tool

use anyhow::{Context, Result};
use clap::Parser;
use sigma_common::logging::{init_logging, LogConfig, LogLevel};
use sigma_tap::runs::{self, ScheduledQueryRun};
use sigma_tap::singer::JsonLinesSink;
use sigma_tap::{fetch, sync_sigma_query, SyncOutcome};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "sigma-tap")]
#[command(author, version, about = "Sync Stripe Sigma scheduled query output as a Singer stream")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
enum Command {
    /// Sync one scheduled query to stdout
    Sync {
        /// Scheduled query title, as shown in the Sigma dashboard
        #[arg(short, long)]
        query: String,

        /// Read the run list from a JSON file instead of the Stripe API
        /// (either a bare array or a `{"data": [...]}` envelope)
        #[arg(long)]
        runs_file: Option<String>,

        /// Staging folder for the downloaded file
        #[arg(short, long, default_value = "stripe_files")]
        folder: String,

        /// Stripe API secret
        #[arg(long, env = "STRIPE_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbose flag
    let log_level = if cli.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };

    let log_config = LogConfig::builder()
        .level(log_level)
        .log_file_prefix("sigma-tap".to_string())
        .build();

    // Merge with environment variables (they take precedence)
    let log_config = LogConfig::from_env().unwrap_or(log_config);

    init_logging(&log_config)?;

    match cli.command {
        Command::Sync {
            query,
            runs_file,
            folder,
            client_secret,
        } => {
            let client = fetch::download_client()?;

            let runs = match runs_file {
                Some(path) => load_runs_file(&path)?,
                None => runs::list_scheduled_query_runs(&client, &client_secret).await?,
            };

            let mut sink = JsonLinesSink::stdout();
            let outcome =
                sync_sigma_query(&client, &query, &runs, &client_secret, &folder, &mut sink)
                    .await?;

            match outcome {
                SyncOutcome::Skipped => info!(query = %query, "Nothing to sync"),
                SyncOutcome::Synced { stream, records } => {
                    info!(stream = %stream, records, "Sync complete")
                },
            }
        },
    }

    Ok(())
}

/// Load run descriptors from a local JSON file.
///
/// Accepts either the raw Stripe list response (`{"data": [...]}`) or a
/// bare JSON array of runs.
fn load_runs_file(path: &str) -> Result<Vec<ScheduledQueryRun>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read runs file {}", path))?;

    #[derive(serde::Deserialize)]
    #[serde(untagged)]
    enum RunsFile {
        Envelope { data: Vec<ScheduledQueryRun> },
        Bare(Vec<ScheduledQueryRun>),
    }

    let parsed: RunsFile = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse runs file {}", path))?;

    Ok(match parsed {
        RunsFile::Envelope { data } => data,
        RunsFile::Bare(runs) => runs,
    })
}

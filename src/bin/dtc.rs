//! CLI binary for dtc-client.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ClientConfig` / `SubmitOptions` and prints results.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dtc_client::{ClientConfig, DtcClient, SubmitOptions, TaskHandle};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "dtc",
    version,
    about = "Submit documents to the Data Toolchain processing API"
)]
struct Cli {
    /// API key for the service.
    #[arg(long, env = "DTC_API_KEY", hide_env_values = true)]
    api_key: String,

    /// Base URL of the service.
    #[arg(long, env = "DTC_BASE_URL")]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a document and print the extracted text.
    Process {
        /// Path to the document to submit.
        file: PathBuf,

        /// Override the detected content type.
        #[arg(long)]
        content_type: Option<String>,

        /// Fixed per-attempt timeout in seconds (default: sized to the file).
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum submission attempts.
        #[arg(long, default_value_t = 3)]
        attempts: u32,

        /// Print the full result as JSON instead of just the text.
        #[arg(long)]
        json: bool,

        /// Write the extracted text to a file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the status of a task.
    Status {
        /// Task token.
        token: String,
    },

    /// Cancel a running task.
    Cancel {
        /// Task token.
        token: String,
    },

    /// List available services.
    Services {
        /// Filter by service name.
        #[arg(long)]
        name: Option<String>,
    },

    /// Print the service version.
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut builder = ClientConfig::builder().api_key(cli.api_key);
    if let Some(url) = cli.base_url {
        builder = builder.base_url(url);
    }
    let config = builder.build().context("invalid configuration")?;
    let client = DtcClient::new(config).context("failed to construct client")?;

    match cli.command {
        Command::Process {
            file,
            content_type,
            timeout,
            attempts,
            json,
            output,
        } => {
            let mut opts = SubmitOptions::new().max_attempts(attempts);
            if let Some(ct) = content_type {
                opts = opts.content_type(ct);
            }
            if let Some(secs) = timeout {
                opts = opts.timeout(Duration::from_secs(secs));
            }

            let spinner = ProgressBar::new_spinner();
            spinner.set_style(
                ProgressStyle::with_template("{spinner:.cyan} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            spinner.set_message(format!("Processing {}…", file.display()));
            spinner.enable_steady_tick(Duration::from_millis(80));

            let result = client.process_document(&file, &opts).await;
            spinner.finish_and_clear();
            let result =
                result.with_context(|| format!("failed to process '{}'", file.display()))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if let Some(path) = output {
                std::fs::write(&path, &result.extracted_text)
                    .with_context(|| format!("failed to write '{}'", path.display()))?;
                eprintln!("Wrote {} bytes to {}", result.extracted_text.len(), path.display());
            } else {
                println!("{}", result.extracted_text);
            }
            eprintln!(
                "objects: {}/{}",
                result.stats.objects_completed, result.stats.objects_requested
            );
        }

        Command::Status { token } => {
            let info = client.task_status(&TaskHandle::new(token)).await?;
            println!("{}", serde_json::to_string_pretty(&info)?);
        }

        Command::Cancel { token } => {
            client.cancel_task(&TaskHandle::new(token)).await?;
            eprintln!("Cancelled.");
        }

        Command::Services { name } => {
            let services = client.services(name.as_deref()).await?;
            for s in &services {
                println!(
                    "{:<20} {:<10} {}",
                    s.name,
                    s.status,
                    s.version.as_deref().unwrap_or("-")
                );
            }
            if services.is_empty() {
                eprintln!("No services reported.");
            }
        }

        Command::Version => {
            println!("{}", client.version().await?);
        }
    }

    Ok(())
}

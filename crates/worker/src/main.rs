//! shellward entry point.
//!
//! Logging goes to stderr so routed response bodies can stream to stdout.

use std::io::Write;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use shellward_client::{FetchClient, FetchConfig, fetch::url as urls};
use shellward_core::{AppConfig, CacheDb};
use shellward_worker::{Destination, Dispatched, FetchRequest, Worker, WorkerEvent};

#[derive(Parser)]
#[command(name = "shellward", version, about = "Offline-capable asset cache worker")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Populate the store for the configured version from the manifest
    Install,
    /// Delete stores for stale versions and take over serving
    Activate,
    /// Install then activate immediately
    Up,
    /// Route a single request and write the response body to stdout
    Fetch {
        url: String,
        #[arg(long, value_enum, default_value = "other")]
        destination: DestinationArg,
    },
    /// Show store versions and entry counts
    Status,
}

#[derive(Clone, Copy, ValueEnum)]
enum DestinationArg {
    Document,
    Image,
    Other,
}

impl From<DestinationArg> for Destination {
    fn from(value: DestinationArg) -> Self {
        match value {
            DestinationArg::Document => Destination::Document,
            DestinationArg::Image => Destination::Image,
            DestinationArg::Other => Destination::Other,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load()?;
    let db = CacheDb::open(&config.db_path).await?;
    let net = FetchClient::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        max_bytes: config.max_bytes,
        timeout: config.timeout(),
        ..Default::default()
    })?;
    let worker = Worker::new(config, db, Arc::new(net)).await?;

    match cli.command {
        Command::Install => {
            worker.dispatch(WorkerEvent::Install).await?;
        }
        Command::Activate => {
            worker.dispatch(WorkerEvent::Activate).await?;
        }
        Command::Up => {
            worker.dispatch(WorkerEvent::Install).await?;
            worker.dispatch(WorkerEvent::Activate).await?;
        }
        Command::Fetch { url, destination } => {
            let url = urls::canonicalize(&url)?;
            let req = FetchRequest::new(url).with_destination(destination.into());
            match worker.dispatch(WorkerEvent::Fetch(req)).await? {
                Dispatched::Response(resp) => {
                    tracing::info!(
                        status = resp.status,
                        content_type = resp.content_type.as_deref().unwrap_or("-"),
                        source = ?resp.source,
                        "resolved"
                    );
                    std::io::stdout().write_all(&resp.body)?;
                }
                other => anyhow::bail!("unexpected dispatch result: {other:?}"),
            }
        }
        Command::Status => {
            let current = worker.config().cache_version.clone();
            for version in worker.db().list_versions().await? {
                let entries = worker.db().entry_count(&version).await?;
                let marker = if version == current { "*" } else { " " };
                println!("{marker} {version}\t{entries} entries");
            }
        }
    }

    Ok(())
}

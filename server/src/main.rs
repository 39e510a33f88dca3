//! contentsync command-line tool
//!
//! Serves a site snapshot as a sync source, pulls items from a source into
//! a local snapshot, and tests source connections.
//!
//! Usage:
//!   contentsync serve --site site.json --account editor:app-password
//!   contentsync pull --config source.toml --site site.json --item 12 --source about-us
//!   contentsync ping --config source.toml

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use contentsync_model::Destination;
use contentsync_server::{Account, SourceState, build_router};
use contentsync_site::MemorySite;
use contentsync_sync::config::DEFAULT_API_PATH;
use contentsync_sync::{PingStatus, PullRequest, SourceClient, SourceConfig, pull};
use contentsync_types::{ContentId, SourceIdentifier};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "contentsync")]
#[command(about = "Pull content items between sites")]
struct Args {
    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve a site snapshot as a sync source
    Serve {
        /// Site snapshot to serve
        #[arg(short, long)]
        site: PathBuf,

        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Address to bind
        #[arg(long, default_value = "0.0.0.0")]
        bind: String,

        /// Accepted credentials as user:password (repeatable)
        #[arg(short, long = "account", required = true)]
        accounts: Vec<Account>,

        /// Also accept credentials in query parameters
        #[arg(long)]
        allow_query_auth: bool,

        /// Path the API is served under
        #[arg(long, default_value = DEFAULT_API_PATH)]
        api_path: String,
    },

    /// Pull one item from a source into a site snapshot
    Pull {
        /// Source connection settings (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,

        /// Destination site snapshot, rewritten after the pull
        #[arg(short, long)]
        site: PathBuf,

        /// Destination item ID
        #[arg(short, long)]
        item: u64,

        /// Source item ID or slug
        #[arg(long)]
        source: String,

        /// Content type to request (defaults to the destination item's)
        #[arg(long)]
        content_type: Option<String>,

        /// Directory imported files are written to
        #[arg(long, requires = "public_url")]
        uploads: Option<PathBuf>,

        /// Base URL imported files are served from
        #[arg(long, requires = "uploads")]
        public_url: Option<String>,
    },

    /// Test the connection to a source
    Ping {
        /// Source connection settings (TOML or JSON)
        #[arg(short, long)]
        config: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    match args.command {
        Command::Serve {
            site,
            port,
            bind,
            accounts,
            allow_query_auth,
            api_path,
        } => serve(site, &bind, port, accounts, allow_query_auth, api_path).await,
        Command::Pull {
            config,
            site,
            item,
            source,
            content_type,
            uploads,
            public_url,
        } => {
            let mut target = MemorySite::load(&site)
                .with_context(|| format!("Failed to load site {}", site.display()))?;
            if let (Some(dir), Some(url)) = (uploads, public_url) {
                target = target.with_uploads(dir, &url);
            }

            let Some(item) = ContentId::new(item) else {
                bail!("Item ID must be a positive integer");
            };
            let mut request = PullRequest::new(item, SourceIdentifier::parse(&source)?);
            if let Some(content_type) = content_type {
                request = request.with_content_type(&content_type);
            }

            let client = SourceClient::new(SourceConfig::load(&config)?)?;
            let report = pull(&client, Destination::of(&target), &request)
                .await
                .with_context(|| format!("Pull of {source} into item {item} failed"))?;

            target
                .save(&site)
                .with_context(|| format!("Failed to save site {}", site.display()))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        Command::Ping { config } => {
            let client = SourceClient::new(SourceConfig::load(&config)?)?;
            match client.ping().await? {
                PingStatus::Connected => println!("Connected to {}", client.config().base_url),
                PingStatus::Reachable => println!(
                    "Reached {} but the sync API was not found; check that it is installed",
                    client.config().base_url
                ),
            }
            Ok(())
        }
    }
}

async fn serve(
    site: PathBuf,
    bind: &str,
    port: u16,
    accounts: Vec<Account>,
    allow_query_auth: bool,
    api_path: String,
) -> Result<()> {
    let snapshot = MemorySite::load(&site)
        .with_context(|| format!("Failed to load site {}", site.display()))?;
    info!(
        "Serving {} items from {} for {} account(s)",
        snapshot.items().len(),
        site.display(),
        accounts.len()
    );

    let state = Arc::new(SourceState {
        site: Arc::new(snapshot),
        accounts,
        allow_query_auth,
        api_path,
    });
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}"))
        .await
        .with_context(|| format!("Failed to bind {bind}:{port}"))?;
    info!("Source API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await.context("HTTP server failed")
}

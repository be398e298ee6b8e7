//! grep++ version controller
//!
//! Watches a project directory, keeps the local object cache consistent
//! with the filesystem, and streams tokenized file updates to the
//! indexing service.

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use grepplus_object_cache::{ChangeWatcher, HttpSyncClient, ObjectCache, DEFAULT_SERVER_URL};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "grepplus", version, about = "grep++ version controller")]
struct Cli {
    /// Log chatter: -v for debug, -vv for trace
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a project directory and keep its semantic index in sync
    Watch {
        /// Project directory to watch (defaults to the current directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Base URL of the indexing service
        #[arg(long, default_value = DEFAULT_SERVER_URL)]
        server: String,
    },
}

fn log_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(log_filter(cli.verbose)),
    )
    .target(env_logger::Target::Stderr)
    .init();

    match cli.command {
        Command::Watch { dir, server } => watch(dir, server).await,
    }
}

async fn watch(dir: Option<PathBuf>, server: String) -> Result<()> {
    let project_dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };

    let sync = Arc::new(HttpSyncClient::new(server)?);
    let mut cache = ObjectCache::open(&project_dir, sync).await?;

    let stats = cache.reconcile().await?;
    log::info!("Startup reconciliation: {stats:?}");

    let handle = ChangeWatcher::start(cache)?;
    log::info!("Monitoring directory: {}", project_dir.display());

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down, flushing index");
    handle.shutdown().await?;

    Ok(())
}

//! IHORMS command-line client

mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use ihorms_client::{ApiError, ConfigManager, FileSessionStore, SessionEvent, SessionStore};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::commands::Commands;

#[derive(Parser)]
#[command(name = "ihorms")]
#[command(about = "Talk to the IHORMS API with a persistent session")]
#[command(version)]
struct Cli {
    /// Config file to use instead of the per-user one
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Session file to use instead of the per-user one
    #[arg(long, global = true)]
    session_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => ConfigManager::from_path(path)?,
        None => ConfigManager::new()?,
    };

    let storage = match cli.session_file {
        Some(path) => FileSessionStore::with_path(path),
        None => FileSessionStore::new().context("Failed to open session storage")?,
    };
    let session = SessionStore::init(Arc::new(storage)).await;
    let events = session.subscribe();

    let result = cli.command.execute(&config, session).await;

    if *events.borrow() == Some(SessionEvent::Expired) {
        eprintln!("Your session has expired. Run `ihorms login` to sign in again.");
    }

    if let Err(e) = result {
        tracing::error!("Command failed: {e:#}");
        std::process::exit(exit_code(&e));
    }

    Ok(())
}

/// Maps a failure to the process exit code
///
/// 2 for authentication and access failures, 3 for other backend rejections,
/// 1 for everything else.
fn exit_code(error: &anyhow::Error) -> i32 {
    match error.downcast_ref::<ApiError>().and_then(ApiError::status) {
        Some(401 | 403) => 2,
        Some(_) => 3,
        None => 1,
    }
}

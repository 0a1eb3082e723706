use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use snipboard::{system_clipboard, ClipboardWatcher, Database};

#[derive(Debug, Parser)]
#[command(name = "snipboard", about = "Clipboard history and code snippet vault")]
struct Args {
    /// Path to the SQLite database file.
    #[arg(long, default_value = "snipboard.sqlite3")]
    db_path: PathBuf,

    /// Clipboard poll interval in milliseconds.
    #[arg(long, default_value_t = 2000)]
    poll_ms: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();

    let db = Arc::new(Database::new(&args.db_path).context("failed to open database")?);
    let clipboard = system_clipboard().context("failed to open system clipboard")?;
    let watcher = Arc::new(ClipboardWatcher::with_poll_interval(
        db,
        clipboard,
        Duration::from_millis(args.poll_ms),
    ));

    watcher.start();
    info!(
        "watching clipboard every {}ms, database at {}",
        args.poll_ms,
        args.db_path.display()
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");
    watcher.stop().await;

    Ok(())
}

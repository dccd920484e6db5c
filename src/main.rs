//! Main entry point for the takeout-import CLI application.
//!
//! Reads a Takeout export from a file or stdin and prints the channel
//! subscriptions it contains.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use tracing_subscriber::EnvFilter;

use takeout_import::{Cli, SubscriptionExtractor, SubscriptionItem, open_input};

/// Application entry point.
///
/// Parsing is blocking I/O, so it runs on the blocking pool while the
/// runtime waits for the result.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let content_type = cli.content_type();
    let extractor = SubscriptionExtractor::new(cli.service_id);
    let input = open_input(&cli.file)?;

    tracing::info!(
        file = %cli.file,
        content_type = content_type.as_deref().unwrap_or("json (default)"),
        "Reading export"
    );

    let items = tokio::task::spawn_blocking(move || {
        extractor.extract(input, content_type.as_deref())
    })
    .await
    .context("Import task panicked")?
    .with_context(|| format!("Failed to import subscriptions from '{}'", cli.file))?;

    print_items(&items, cli.json)?;
    Ok(())
}

/// Print subscriptions to stdout.
///
/// Either one `url<TAB>title` line per subscription, or a single JSON array.
fn print_items(items: &[SubscriptionItem], json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    if json {
        serde_json::to_writer_pretty(&mut out, items)?;
        writeln!(out)?;
    } else {
        for item in items {
            writeln!(out, "{}\t{}", item.url, item.title)?;
        }
    }

    out.flush()?;
    Ok(())
}

//! Café admin console entry point.

use std::sync::Arc;

use anyhow::Context;
use cafe_admin::{AdminApp, AdminConfig};
use clap::Parser;
use common_auth::MemoryNotifier;
use common_token_store::FileStorage;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AdminConfig::from_env()?;
    let storage = FileStorage::open(&config.storage_path).with_context(|| {
        format!(
            "failed to open client storage at {}",
            config.storage_path.display()
        )
    })?;

    let notifier = Arc::new(MemoryNotifier::new());
    let app = AdminApp::new(config, Arc::new(storage), notifier.clone())?;

    let outcome = cli.execute(&app).await;
    for notification in notifier.take() {
        eprintln!("[{}] {}", notification.kind, notification.message);
    }
    if cli.metrics {
        print!("{}", app.metrics().render()?);
    }
    outcome
}

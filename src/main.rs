//! Fund Dispatcher
use anyhow::Result;
use clap::Parser;
use fund_dispatcher::config::Settings;
use fund_dispatcher::dispatcher::Dispatcher;
use fund_dispatcher::rpc::MutualTlsConnector;
use fund_dispatcher::scheduler::Scheduler;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::prelude::*;

#[derive(Parser)]
#[command(name = "fund_dispatcher")]
struct Cli {
    /// Settings file; a template is written here if it does not exist.
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fund_dispatcher=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_timer(ChronoLocal::rfc_3339()))
        .init();

    let cli = Cli::parse();

    info!("Loading configuration from {}", cli.config.display());
    let Some(settings) = Settings::load_or_init(&cli.config).await? else {
        return Ok(());
    };

    info!("Configuration loaded:");
    info!(
        "  Wallets: {} ({} enabled)",
        settings.wallets().len(),
        settings.enabled_wallets().count()
    );
    info!("  Dispatch interval: {}s", settings.dispatch_interval().as_secs());
    info!(
        "  Wait for confirmation: {}",
        settings.wait_for_transaction_to_confirm()
    );

    let interval = settings.dispatch_interval();
    let dispatcher = Arc::new(Dispatcher::new(settings, Arc::new(MutualTlsConnector))?);
    let scheduler = Scheduler::new(dispatcher, interval);

    tokio::select! {
        _ = scheduler.run_continuous() => {}
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down ..");
        }
    }

    info!("Fund Dispatcher shutdown complete");
    Ok(())
}

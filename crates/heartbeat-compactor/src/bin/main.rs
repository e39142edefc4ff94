use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use heartbeat_config::RuntimeConfig;
use heartbeat_storage::StorageLayout;

/// Periodic compaction pass: folds part-*.parquet files into compacted.parquet
#[derive(Parser)]
#[command(name = "heartbeat-compactor")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (overrides HEARTBEAT_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?
        .block_on(async_main(cli))
}

async fn async_main(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::load().context("failed to load configuration")?,
    };

    init_tracing(&config);

    let layout = StorageLayout::from_config(&config.storage);
    let shutdown = Arc::new(AtomicBool::new(false));
    tokio::spawn(watch_for_shutdown_signal(shutdown.clone()));

    heartbeat_compactor::run(layout, config.compactor.min_parts_to_compact, config.compactor.sleep_seconds, shutdown).await;
    Ok(())
}

async fn watch_for_shutdown_signal(shutdown: Arc<AtomicBool>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let Ok(mut signal) = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) else {
            return;
        };
        signal.recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
    shutdown.store(true, Ordering::Relaxed);
}

fn init_tracing(config: &RuntimeConfig) {
    use heartbeat_config::LogFormat;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let env_filter = EnvFilter::try_new(&config.server.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(env_filter);

    match config.server.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer()).init(),
    }
}

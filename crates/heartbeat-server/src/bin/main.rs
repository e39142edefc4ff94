use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use heartbeat_config::RuntimeConfig;
use heartbeat_queue::{DurableQueue, RedisQueue};
use heartbeat_server::AppState;
use heartbeat_storage::StorageLayout;

/// HTTP server for ingesting and querying heart-rate samples
#[derive(Parser)]
#[command(name = "heartbeat-server")]
#[command(version)]
struct Cli {
    /// Path to a TOML config file (overrides HEARTBEAT_CONFIG)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// HTTP listen address, e.g. 0.0.0.0:8000 (overrides config file)
    #[arg(short, long, value_name = "ADDR")]
    listen: Option<String>,
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
    let mut config = match &cli.config {
        Some(path) => RuntimeConfig::load_from_path(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => RuntimeConfig::load().context("failed to load configuration")?,
    };
    if let Some(addr) = &cli.listen {
        config.server.listen_addr = addr.clone();
    }

    init_tracing(&config);

    let queue = RedisQueue::connect(&config.queue)
        .await
        .context("failed to connect to the queue backend")?;
    let layout = StorageLayout::from_config(&config.storage);

    let state = AppState {
        queue: Arc::new(queue) as Arc<dyn DurableQueue>,
        layout: Arc::new(layout),
    };
    let app = heartbeat_server::router(state);

    let listener = tokio::net::TcpListener::bind(&config.server.listen_addr)
        .await
        .with_context(|| format!("failed to bind to {}", config.server.listen_addr))?;

    tracing::info!(addr = %config.server.listen_addr, "heartbeat-server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("heartbeat-server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
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
        _ = ctrl_c => tracing::info!("received ctrl-c, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
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

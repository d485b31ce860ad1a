//! ord-webhook server.
//!
//! This binary:
//! - Receives signed inscription webhooks on `POST /webhook`
//! - Queues each accepted request for the in-process worker
//! - Downloads the file and runs `ord wallet inscribe` then `ord wallet send`
//!
//! On SIGINT/SIGTERM the server stops accepting requests and the worker
//! finishes any inscriptions already in progress.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use tokio::{net::TcpListener, signal};
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ordhook::web::{router, AppState};
use ordhook::{worker, Config, Dispatcher, InscriptionPipeline};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize structured JSON logging
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().flatten_event(true))
        .init();

    info!("web_server_starting");

    // Load configuration
    let config = Config::from_env();
    if !config.is_secret_configured() {
        bail!("ORDINALS_SECRET must be set to a non-empty value");
    }

    info!(
        port = config.port,
        download_dir = %config.download_dir.display(),
        ord_bin = %config.ord_bin.display(),
        ord_args = ?config.ord_args,
        ord_wallet = %config.ord_wallet,
        "config_loaded"
    );

    tokio::fs::create_dir_all(&config.download_dir)
        .await
        .with_context(|| {
            format!(
                "Failed to create download directory {}",
                config.download_dir.display()
            )
        })?;

    let pipeline =
        InscriptionPipeline::from_config(&config).context("Failed to build HTTP client")?;

    // Start the worker; it exits once every dispatcher is dropped
    let (dispatcher, jobs) = Dispatcher::channel();
    let worker_task = tokio::spawn(worker::run(
        jobs,
        Arc::new(pipeline),
        std::future::pending::<()>(),
    ));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = router(AppState::new(config, dispatcher));

    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(address = %addr, "web_server_listening");

    // Run server with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    // The router (and its dispatcher) is gone, so the worker drains and exits
    worker_task.await.context("Worker task failed")?;

    info!("web_server_shutdown_complete");

    Ok(())
}

/// Create a future that completes when a shutdown signal is received.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("web_server_shutting_down");
}

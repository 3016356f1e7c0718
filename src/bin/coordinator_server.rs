//! # Report Coordinator Server
//!
//! Serves the report creation API and, unless disabled by
//! `listener.embedded = false`, runs the supervised completion listener in the
//! same process.
//!
//! ## Usage
//!
//! ```bash
//! COORDINATOR_ENV=production coordinator-server
//! ```

use anyhow::Context;
use report_coordinator::bootstrap::{shutdown_signal, AppContext};
use report_coordinator::logging;
use report_coordinator::web;
use tokio::sync::watch;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    info!("🚀 Starting Report Coordinator Server...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let context = AppContext::bootstrap()
        .await
        .context("failed to bootstrap application context")?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listener_handle = if context.config.listener.embedded {
        info!("   Completion listener: embedded");
        Some(context.listener_supervisor().spawn(shutdown_rx.clone()))
    } else {
        info!("   Completion listener: external");
        None
    };

    let bind_address = context.config.web.bind_address.clone();
    let tcp = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    info!(bind_address = %bind_address, "🌐 Web API listening");

    let app = web::create_app(context.web_state());
    let mut server_shutdown = shutdown_rx;
    let server = tokio::spawn(async move {
        axum::serve(tcp, app)
            .with_graceful_shutdown(async move {
                let _ = server_shutdown.wait_for(|stop| *stop).await;
            })
            .await
    });

    info!("🎉 Report Coordinator Server started successfully! Press Ctrl+C to shutdown");
    shutdown_signal().await;
    info!("🛑 Shutdown signal received, initiating graceful shutdown...");

    let _ = shutdown_tx.send(true);

    match server.await {
        Ok(Ok(())) => info!("✅ Web server stopped"),
        Ok(Err(e)) => error!(error = %e, "Web server exited with error"),
        Err(e) => error!(error = %e, "Web server task failed"),
    }

    if let Some(handle) = listener_handle {
        if let Err(e) = handle.await {
            error!(error = %e, "Listener supervisor task failed");
        }
    }

    info!("👋 Report Coordinator Server shutdown complete");
    Ok(())
}

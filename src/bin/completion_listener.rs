//! # Completion Listener
//!
//! Standalone process that consumes step completion notifications and
//! triggers reconciliation. Run it when the server is deployed with
//! `listener.embedded = false`.

use anyhow::Context;
use report_coordinator::bootstrap::{shutdown_signal, AppContext};
use report_coordinator::logging;
use std::sync::atomic::Ordering;
use tokio::sync::watch;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_structured_logging();

    info!("🎧 Starting Completion Listener...");
    info!("   Version: {}", env!("CARGO_PKG_VERSION"));

    let context = AppContext::bootstrap()
        .await
        .context("failed to bootstrap application context")?;

    if !context.cache.is_enabled() {
        warn!("Cache store unavailable, no completion notifications will be received");
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let supervisor = context.listener_supervisor();
    let restarts = supervisor.restart_counter();
    let handle = supervisor.spawn(shutdown_rx);

    shutdown_signal().await;
    info!("🛑 Shutdown signal received");

    let _ = shutdown_tx.send(true);
    handle.await.context("listener supervisor task failed")?;

    let stats = context.listener.stats();
    info!(
        received = stats.received,
        reconciled = stats.reconciled,
        dropped = stats.dropped,
        restarts = restarts.load(Ordering::Relaxed),
        "👋 Completion Listener stopped"
    );
    Ok(())
}

//! # Listener Supervisor
//!
//! Keeps one completion listener subscribed for the life of the process.
//! Each run subscribes to the channel and consumes it in its own task; when
//! the subscription fails, the stream ends or the task panics, the supervisor
//! waits `restart_delay` and starts again. A `watch` channel stops it.

use super::completion_listener::CompletionListener;
use super::ListenerError;
use crate::cache::CacheProvider;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

pub struct ListenerSupervisor {
    cache: CacheProvider,
    channel: String,
    listener: CompletionListener,
    restart_delay: Duration,
    restarts: Arc<AtomicU64>,
}

impl ListenerSupervisor {
    pub fn new(
        cache: CacheProvider,
        channel: impl Into<String>,
        listener: CompletionListener,
        restart_delay: Duration,
    ) -> Self {
        Self {
            cache,
            channel: channel.into(),
            listener,
            restart_delay,
            restarts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Counter of listener restarts, readable after `spawn`
    pub fn restart_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.restarts)
    }

    /// Run the supervision loop on its own task
    pub fn spawn(self, shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(self.supervise(shutdown))
    }

    /// Supervision loop; returns once shutdown is signalled
    pub async fn supervise(self, mut shutdown: watch::Receiver<bool>) {
        info!(channel = %self.channel, "🎧 Listener supervisor started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            let result = tokio::select! {
                result = self.run_once() => result,
                _ = shutdown.changed() => break,
            };

            match result {
                Ok(()) => {
                    warn!(channel = %self.channel, "Subscription ended, restarting listener")
                }
                Err(e) => {
                    error!(channel = %self.channel, error = %e, "Listener run failed, restarting")
                }
            }
            self.restarts.fetch_add(1, Ordering::Relaxed);

            tokio::select! {
                _ = tokio::time::sleep(self.restart_delay) => {}
                _ = shutdown.changed() => break,
            }
        }

        info!(
            channel = %self.channel,
            stats = ?self.listener.stats(),
            "⏹️ Listener supervisor stopped"
        );
    }

    async fn run_once(&self) -> Result<(), ListenerError> {
        let stream = self.cache.subscribe(&self.channel).await?;
        info!(channel = %self.channel, "Subscribed to completion channel");

        let listener = self.listener.clone();
        let mut task = ListenerTask(tokio::spawn(async move { listener.run(stream).await }));

        (&mut task.0).await.map_err(|e| {
            if e.is_panic() {
                ListenerError::Crashed(format!("listener task panicked: {e}"))
            } else {
                ListenerError::Crashed(format!("listener task cancelled: {e}"))
            }
        })
    }
}

/// Aborts the consuming task when a run is abandoned (shutdown mid-run)
struct ListenerTask(JoinHandle<()>);

impl Drop for ListenerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

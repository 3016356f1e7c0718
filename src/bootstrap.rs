//! # Application Bootstrap
//!
//! `AppContext` is the dependency container shared by both binaries. It owns
//! one handle per external system and builds the coordination components on
//! top of them. Nothing in the crate reaches for global state; everything is
//! injected from here.
//!
//! Startup order:
//!
//! 1. Cache (graceful, falls back to NoOp)
//! 2. Report store (fatal on failure)
//! 3. Broker, with every configured topic declared (fatal on failure)
//! 4. Dispatcher, fetch cache, completion listener

use crate::cache::{CacheProvider, FetchCache};
use crate::config::{ConfigLoader, CoordinatorConfig};
use crate::dispatch::ReportDispatcher;
use crate::error::CoordinatorResult;
use crate::listener::{CompletionListener, ListenerSupervisor};
use crate::messaging::BrokerProvider;
use crate::notifications::CompletionNotifier;
use crate::reconcile::UpdateSummaryReconciler;
use crate::resilience::RetryPolicy;
use crate::services::{
    RetentionAnalysisService, RetentionAnalyzer, TranscriptService, TranscriptSource,
    VideoDetailService, VideoDetailSource,
};
use crate::store::{self, ReportStore};
use crate::web::AppState;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<CoordinatorConfig>,
    pub cache: CacheProvider,
    pub store: Arc<dyn ReportStore>,
    pub broker: Arc<BrokerProvider>,
    pub fetch_cache: FetchCache,
    pub dispatcher: Arc<ReportDispatcher>,
    pub listener: CompletionListener,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("environment", &self.config.environment)
            .field("cache", &self.cache.provider_name())
            .field("store", &self.store.backend_name())
            .field("broker", &self.broker.provider_name())
            .finish()
    }
}

impl AppContext {
    /// Load configuration for the detected environment and connect everything
    pub async fn bootstrap() -> CoordinatorResult<Self> {
        let config = ConfigLoader::load()?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: CoordinatorConfig) -> CoordinatorResult<Self> {
        info!(environment = %config.environment, "🔧 Initializing application context");
        config.validate()?;

        let cache = CacheProvider::from_config_graceful(&config.cache).await;
        let store = store::connect(&config.database).await?;
        let broker = Arc::new(BrokerProvider::from_config(&config.broker).await?);

        let context = Self::from_parts(config, cache, store, broker);
        info!(context = ?context, "✅ Application context ready");
        Ok(context)
    }

    /// Assemble the context from already-connected handles
    pub fn from_parts(
        config: CoordinatorConfig,
        cache: CacheProvider,
        store: Arc<dyn ReportStore>,
        broker: Arc<BrokerProvider>,
    ) -> Self {
        let fetch_cache = FetchCache::new(cache.clone(), &config.cache);
        let dispatcher = Arc::new(ReportDispatcher::new(
            Arc::clone(&store),
            Arc::clone(&broker),
            config.broker.topics.clone(),
        ));
        let reconciler = Arc::new(UpdateSummaryReconciler::with_metric_diff(Arc::clone(&store)));
        let listener = CompletionListener::new(Arc::clone(&store), reconciler);

        Self {
            config: Arc::new(config),
            cache,
            store,
            broker,
            fetch_cache,
            dispatcher,
            listener,
        }
    }

    pub fn web_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            dispatcher: Arc::clone(&self.dispatcher),
            store: Arc::clone(&self.store),
            broker: Arc::clone(&self.broker),
            cache: self.cache.clone(),
        })
    }

    pub fn listener_supervisor(&self) -> ListenerSupervisor {
        ListenerSupervisor::new(
            self.cache.clone(),
            self.config.notifications.channel.clone(),
            self.listener.clone(),
            self.config.listener.restart_delay(),
        )
    }

    /// Publisher of completion notifications for step workers
    pub fn notifier(&self) -> CompletionNotifier {
        CompletionNotifier::new(self.cache.clone(), self.config.notifications.channel.clone())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::from(&self.config.retry)
    }

    pub fn transcript_service(&self, source: Arc<dyn TranscriptSource>) -> TranscriptService {
        TranscriptService::new(self.fetch_cache.clone(), source)
    }

    pub fn video_detail_service(&self, source: Arc<dyn VideoDetailSource>) -> VideoDetailService {
        VideoDetailService::new(self.fetch_cache.clone(), source)
    }

    pub fn retention_service(
        &self,
        analyzer: Arc<dyn RetentionAnalyzer>,
    ) -> RetentionAnalysisService {
        RetentionAnalysisService::new(analyzer, Arc::clone(&self.store), self.retry_policy())
    }
}

/// Wait for Ctrl+C or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C");
        },
        _ = terminate => {
            info!("Received SIGTERM");
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::DispatchVariant;

    fn memory_config() -> CoordinatorConfig {
        let mut config = CoordinatorConfig::default();
        config.database.backend = "memory".to_string();
        config.broker.backend = "memory".to_string();
        config.cache.backend = "memory".to_string();
        config
    }

    #[tokio::test]
    async fn test_from_config_with_memory_backends() {
        let context = AppContext::from_config(memory_config()).await.unwrap();

        assert_eq!(context.cache.provider_name(), "memory");
        assert_eq!(context.store.backend_name(), "memory");
        assert_eq!(context.broker.provider_name(), "in_memory");
        assert_eq!(context.retry_policy(), RetryPolicy::default());

        let receipt = context
            .dispatcher
            .create_report(5, "token-value", DispatchVariant::V1)
            .await
            .unwrap();
        let task = context
            .store
            .find_task_by_report(receipt.report_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(task.id, receipt.task_id);
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let mut config = memory_config();
        config.retry.max_attempts = 0;
        assert!(AppContext::from_config(config).await.is_err());
    }
}

//! # Completion Listener
//!
//! Consumes completion notifications one at a time, advances the task's
//! per-step statuses and triggers reconciliation once both tracked steps
//! completed.
//!
//! ## Message handling
//!
//! ```text
//! raw payload
//!   ├─ undecodable / no message / no report ──► Dropped(MalformedEnvelope)
//!   ├─ status != "success" ──────────────────► Dropped(NotSuccessful)
//!   ├─ step not tracked ─────────────────────► Dropped(UnknownStep)
//!   ├─ no task for report ───────────────────► Dropped(UnknownReport)
//!   └─ mark step completed (monotonic)
//!        ├─ not all completed ───────────────► Advanced
//!        └─ claim_reconciliation
//!             ├─ lost ───────────────────────► AlreadyReconciled
//!             └─ won ─► reconcile ───────────► Reconciled | ReconciliationFailed
//! ```
//!
//! Nothing here ever stops the loop: every failure is logged and counted.

use crate::cache::PayloadStream;
use crate::models::{Step, StepStatus};
use crate::notifications::CompletionNotice;
use crate::reconcile::{ReconcileOutcome, Reconciler};
use crate::store::ReportStore;
use futures::StreamExt;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DropReason {
    MalformedEnvelope,
    NotSuccessful,
    UnknownStep,
    UnknownReport,
    StoreError,
}

/// What happened to one notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageOutcome {
    Dropped(DropReason),
    /// Step recorded (or already terminal); the task is not ready yet
    Advanced { report_id: i64, step: Step, changed: bool },
    Reconciled { report_id: i64, outcome: ReconcileOutcome },
    /// Both steps done, but another delivery already claimed reconciliation
    AlreadyReconciled { report_id: i64 },
    ReconciliationFailed { report_id: i64 },
}

/// Counters since the listener was created (shared across restarts)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListenerStats {
    pub received: u64,
    pub advanced: u64,
    pub dropped: u64,
    pub reconciled: u64,
    pub already_reconciled: u64,
    pub reconciliation_failures: u64,
}

impl ListenerStats {
    fn record(&mut self, outcome: &MessageOutcome) {
        self.received += 1;
        match outcome {
            MessageOutcome::Dropped(_) => self.dropped += 1,
            MessageOutcome::Advanced { .. } => self.advanced += 1,
            MessageOutcome::Reconciled { .. } => self.reconciled += 1,
            MessageOutcome::AlreadyReconciled { .. } => self.already_reconciled += 1,
            MessageOutcome::ReconciliationFailed { .. } => self.reconciliation_failures += 1,
        }
    }
}

#[derive(Clone)]
pub struct CompletionListener {
    store: Arc<dyn ReportStore>,
    reconciler: Arc<dyn Reconciler>,
    stats: Arc<Mutex<ListenerStats>>,
}

impl std::fmt::Debug for CompletionListener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionListener")
            .field("store", &self.store.backend_name())
            .field("stats", &*self.stats.lock())
            .finish()
    }
}

impl CompletionListener {
    pub fn new(store: Arc<dyn ReportStore>, reconciler: Arc<dyn Reconciler>) -> Self {
        Self {
            store,
            reconciler,
            stats: Arc::new(Mutex::new(ListenerStats::default())),
        }
    }

    pub fn stats(&self) -> ListenerStats {
        self.stats.lock().clone()
    }

    /// Consume `stream` sequentially until it ends
    pub async fn run(&self, mut stream: PayloadStream) {
        info!("🎧 Completion listener consuming notifications");
        while let Some(payload) = stream.next().await {
            self.handle_payload(&payload).await;
        }
        warn!("Completion notification stream ended");
    }

    /// Process one raw notification
    pub async fn handle_payload(&self, raw: &str) -> MessageOutcome {
        let outcome = self.process(raw).await;
        self.stats.lock().record(&outcome);
        outcome
    }

    async fn process(&self, raw: &str) -> MessageOutcome {
        let notice = match CompletionNotice::decode(raw) {
            Ok(notice) => notice,
            Err(e) => {
                warn!(error = %e, payload = raw, "⚠️ Dropping malformed notification");
                return MessageOutcome::Dropped(DropReason::MalformedEnvelope);
            }
        };
        let report_id = notice.report_id;

        if !notice.is_success() {
            info!(
                report_id = report_id,
                status = ?notice.status,
                step = ?notice.step,
                "⚠️ Ignoring unsuccessful notification"
            );
            return MessageOutcome::Dropped(DropReason::NotSuccessful);
        }

        let Some(step) = notice.tracked_step() else {
            info!(report_id = report_id, step = ?notice.step, "⚠️ Ignoring untracked step");
            return MessageOutcome::Dropped(DropReason::UnknownStep);
        };

        info!(report_id = report_id, step = %step, "📥 Step completion received");

        let update = match self
            .store
            .mark_step(report_id, step, StepStatus::Completed)
            .await
        {
            Ok(Some(update)) => update,
            Ok(None) => {
                warn!(report_id = report_id, step = %step, "No task for report, dropping");
                return MessageOutcome::Dropped(DropReason::UnknownReport);
            }
            Err(e) => {
                error!(report_id = report_id, step = %step, error = %e, "Failed to record step");
                return MessageOutcome::Dropped(DropReason::StoreError);
            }
        };

        if !update.changed {
            debug!(
                report_id = report_id,
                step = %step,
                status = %update.task.status(step),
                "Step already terminal, duplicate or late notification"
            );
        }

        if !update.task.all_completed() {
            return MessageOutcome::Advanced {
                report_id,
                step,
                changed: update.changed,
            };
        }

        match self.store.claim_reconciliation(report_id).await {
            Ok(true) => self.reconcile(report_id).await,
            Ok(false) => {
                debug!(report_id = report_id, "Reconciliation already claimed");
                MessageOutcome::AlreadyReconciled { report_id }
            }
            Err(e) => {
                error!(report_id = report_id, error = %e, "Failed to claim reconciliation");
                MessageOutcome::Dropped(DropReason::StoreError)
            }
        }
    }

    async fn reconcile(&self, report_id: i64) -> MessageOutcome {
        info!(report_id = report_id, "✅ All steps completed, reconciling");
        match self.reconciler.reconcile(report_id).await {
            Ok(outcome) => {
                info!(report_id = report_id, outcome = ?outcome, "🎉 Reconciliation finished");
                MessageOutcome::Reconciled { report_id, outcome }
            }
            Err(e) => {
                error!(report_id = report_id, error = %e, "❌ Reconciliation failed");
                MessageOutcome::ReconciliationFailed { report_id }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::CompletionNotifier;
    use crate::reconcile::UpdateSummaryReconciler;
    use crate::store::InMemoryReportStore;

    async fn setup() -> (Arc<InMemoryReportStore>, CompletionListener, i64) {
        let store = Arc::new(InMemoryReportStore::new());
        let report_id = store.create_unit_of_work(1).await.unwrap().report.id;
        let reconciler = Arc::new(UpdateSummaryReconciler::with_metric_diff(store.clone()));
        let listener = CompletionListener::new(store.clone(), reconciler);
        (store, listener, report_id)
    }

    fn success(report_id: i64, step: Step) -> String {
        CompletionNotifier::encode("user", report_id, step, true)
    }

    #[tokio::test]
    async fn test_single_step_advances() {
        let (store, listener, report_id) = setup().await;

        let outcome = listener.handle_payload(&success(report_id, Step::Overview)).await;
        assert_eq!(
            outcome,
            MessageOutcome::Advanced {
                report_id,
                step: Step::Overview,
                changed: true
            }
        );
        let task = store.find_task_by_report(report_id).await.unwrap().unwrap();
        assert_eq!(task.overview_status, StepStatus::Completed);
        assert_eq!(task.analysis_status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_second_step_reconciles() {
        let (_store, listener, report_id) = setup().await;

        listener.handle_payload(&success(report_id, Step::Analysis)).await;
        let outcome = listener.handle_payload(&success(report_id, Step::Overview)).await;

        assert_eq!(
            outcome,
            MessageOutcome::Reconciled {
                report_id,
                outcome: ReconcileOutcome::NoPreviousReport
            }
        );
    }

    #[tokio::test]
    async fn test_failure_status_is_dropped_without_state_change() {
        let (store, listener, report_id) = setup().await;

        let raw = CompletionNotifier::encode("user", report_id, Step::Overview, false);
        assert_eq!(
            listener.handle_payload(&raw).await,
            MessageOutcome::Dropped(DropReason::NotSuccessful)
        );
        let task = store.find_task_by_report(report_id).await.unwrap().unwrap();
        assert_eq!(task.overview_status, StepStatus::Pending);
    }

    #[tokio::test]
    async fn test_unknown_report_is_dropped() {
        let (_store, listener, _) = setup().await;
        assert_eq!(
            listener.handle_payload(&success(777, Step::Overview)).await,
            MessageOutcome::Dropped(DropReason::UnknownReport)
        );
    }

    #[tokio::test]
    async fn test_store_outage_is_dropped_and_counted() {
        let (store, listener, report_id) = setup().await;
        store.set_available(false);

        assert_eq!(
            listener.handle_payload(&success(report_id, Step::Overview)).await,
            MessageOutcome::Dropped(DropReason::StoreError)
        );
        assert_eq!(listener.stats().dropped, 1);
    }

    #[tokio::test]
    async fn test_stats_track_outcomes() {
        let (_store, listener, report_id) = setup().await;

        listener.handle_payload("garbage").await;
        listener.handle_payload(&success(report_id, Step::Overview)).await;
        listener.handle_payload(&success(report_id, Step::Analysis)).await;
        listener.handle_payload(&success(report_id, Step::Analysis)).await;

        assert_eq!(
            listener.stats(),
            ListenerStats {
                received: 4,
                advanced: 1,
                dropped: 1,
                reconciled: 1,
                already_reconciled: 1,
                reconciliation_failures: 0,
            }
        );
    }
}

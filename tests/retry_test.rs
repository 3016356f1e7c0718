//! Retry-guarded upstream calls on a paused clock

use report_coordinator::resilience::{call_with_retry, RetryPolicy};
use report_coordinator::services::UpstreamError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

const PLACEHOLDER: &str = "placeholder";

/// Fails with `errors` in order, then succeeds
struct Script {
    calls: AtomicU32,
    errors: Vec<UpstreamError>,
}

impl Script {
    fn new(errors: Vec<UpstreamError>) -> Self {
        Self {
            calls: AtomicU32::new(0),
            errors,
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    async fn call(&self) -> Result<String, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
        match self.errors.get(call) {
            Some(error) => Err(error.clone()),
            None => Ok("analysis".to_string()),
        }
    }
}

async fn run(script: &Script) -> Result<String, UpstreamError> {
    call_with_retry(&RetryPolicy::default(), "test", PLACEHOLDER.to_string(), || {
        script.call()
    })
    .await
}

#[tokio::test(start_paused = true)]
async fn two_timeouts_then_success_waits_five_then_ten_seconds() {
    let script = Script::new(vec![
        UpstreamError::ReadTimeout("1".into()),
        UpstreamError::Connection("2".into()),
    ]);
    let started = Instant::now();

    let result = run(&script).await;

    assert_eq!(result.unwrap(), "analysis");
    assert_eq!(script.calls(), 3);
    assert_eq!(started.elapsed(), Duration::from_secs(15));
}

#[tokio::test(start_paused = true)]
async fn three_timeouts_yield_placeholder() {
    let script = Script::new(vec![
        UpstreamError::ConnectTimeout("1".into()),
        UpstreamError::ReadTimeout("2".into()),
        UpstreamError::Timeout("3".into()),
    ]);

    let result = run(&script).await;

    assert_eq!(result.unwrap(), PLACEHOLDER);
    assert_eq!(script.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn input_errors_propagate_without_waiting() {
    for error in [
        UpstreamError::MissingAttribute("a".into()),
        UpstreamError::WrongType("b".into()),
        UpstreamError::MissingKey("c".into()),
        UpstreamError::Other("d".into()),
    ] {
        let script = Script::new(vec![error.clone()]);
        let started = Instant::now();

        let result = run(&script).await;

        assert_eq!(result.unwrap_err(), error);
        assert_eq!(script.calls(), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }
}

#[tokio::test(start_paused = true)]
async fn fatal_error_after_a_retry_stops_immediately() {
    let script = Script::new(vec![
        UpstreamError::ReadTimeout("1".into()),
        UpstreamError::Other("2".into()),
    ]);
    let started = Instant::now();

    let result = run(&script).await;

    assert!(matches!(result, Err(UpstreamError::Other(_))));
    assert_eq!(script.calls(), 2);
    assert_eq!(started.elapsed(), Duration::from_secs(5));
}

//! # Resilience Module
//!
//! Fault tolerance for upstream calls whose failure should degrade a report
//! rather than fail it.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use report_coordinator::resilience::{call_with_retry, RetryPolicy};
//! use report_coordinator::services::UpstreamError;
//!
//! # async fn example() -> Result<(), UpstreamError> {
//! let analysis = call_with_retry(
//!     &RetryPolicy::default(),
//!     "retention_analysis",
//!     "unavailable".to_string(),
//!     || async { Ok::<String, UpstreamError>("retention curve looks healthy".to_string()) },
//! )
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod retry;

pub use retry::{call_with_retry, Classify, ErrorClass, RetryPolicy};

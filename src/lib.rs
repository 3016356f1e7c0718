#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, RabbitMQ in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Report Coordinator
//!
//! Coordination core for a video report generator. A report is produced by
//! two independent remote workers (overview and analysis); this crate creates
//! the unit of work, dispatches both steps, tracks their completion and
//! triggers the follow-up update summary exactly once.
//!
//! ## Module Organization
//!
//! - [`cache`] - Cache store adapter and the stampede-safe fetch cache
//! - [`dispatch`] - Unit-of-work creation and V1/V2 step dispatch
//! - [`listener`] - Completion listener and its supervisor
//! - [`notifications`] - Completion notification envelope
//! - [`reconcile`] - Update summary generation after both steps finish
//! - [`resilience`] - Retry-guarded upstream calls
//! - [`services`] - Cached transcript/video detail lookups, retention analysis
//! - [`store`] - Report and task persistence (PostgreSQL or in-memory)
//! - [`messaging`] - Broker abstraction (RabbitMQ or in-memory)
//! - [`web`] - HTTP entry points
//! - [`bootstrap`] - `AppContext` dependency container
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use report_coordinator::bootstrap::AppContext;
//! use report_coordinator::dispatch::DispatchVariant;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = AppContext::bootstrap().await?;
//! let receipt = context
//!     .dispatcher
//!     .create_report(42, "google-access-token", DispatchVariant::V1)
//!     .await?;
//! println!("dispatched task {}", receipt.task_id);
//! # Ok(())
//! # }
//! ```

pub mod bootstrap;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod listener;
pub mod logging;
pub mod messaging;
pub mod models;
pub mod notifications;
pub mod reconcile;
pub mod resilience;
pub mod services;
pub mod store;
pub mod web;

pub use bootstrap::AppContext;
pub use config::CoordinatorConfig;
pub use error::{CoordinatorError, CoordinatorResult};

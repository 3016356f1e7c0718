//! # Report Store
//!
//! Persistence for units of work. `PgReportStore` is the production backend;
//! `InMemoryReportStore` mirrors its semantics in-process.

pub mod errors;
pub mod memory;
pub mod postgres;
pub mod traits;

pub use errors::{StoreError, StoreResult};
pub use memory::InMemoryReportStore;
pub use postgres::PgReportStore;
pub use traits::{ReportStore, StepUpdate};

use crate::config::DatabaseConfig;
use std::sync::Arc;
use tracing::info;

/// Build the store selected by configuration
pub async fn connect(config: &DatabaseConfig) -> StoreResult<Arc<dyn ReportStore>> {
    match config.backend.as_str() {
        "memory" => {
            info!("Using in-memory report store");
            Ok(Arc::new(InMemoryReportStore::new()))
        }
        _ => Ok(Arc::new(PgReportStore::connect(config).await?)),
    }
}

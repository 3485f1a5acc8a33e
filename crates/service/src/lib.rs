//! Service layer for pricetrail
//!
//! Serializes merges per product identity, fans bulk ingestion out over a
//! bounded worker pool and exposes the read-only query layer.

#![allow(missing_docs, reason = "Internal crate with self-explanatory API")]
#![allow(clippy::missing_errors_doc, reason = "Errors are self-explanatory from Result types")]
#![allow(missing_debug_implementations, reason = "Internal types")]
#![allow(clippy::implicit_return, reason = "Implicit return is idiomatic Rust")]
#![allow(clippy::question_mark_used, reason = "? operator is idiomatic Rust")]

mod bulk;
mod config;
mod error;
mod locks;
mod merge_service;
mod query_service;
mod telemetry;
#[cfg(test)]
mod tests;
mod tracker;

pub use bulk::{BulkSummary, ItemFailure};
pub use config::IngestConfig;
pub use error::ServiceError;
pub use locks::{KeyGuard, KeyedLocks};
pub use merge_service::MergeService;
pub use query_service::QueryService;
pub use telemetry::init_tracing;
pub use tracker::PriceTracker;
